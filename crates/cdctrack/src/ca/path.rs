//! Extraction of maximal-score paths after state assignment.

use super::{relations_from, AutomatonCell, WeightedRelation};

/// Extract best paths from the relation graph, highest cell state first.
///
/// Starting from the unassigned cell with the highest state, the follower
/// walks the optimal continuation: a relation `f -> t` is on an optimal
/// path exactly when `state(f) == weight(f) + relation_weight + state(t)`.
/// Cells on an extracted path are flagged [`AutomatonCell::ASSIGNED`] so
/// they cannot seed or join another path in the same pass.
///
/// Paths whose start state falls below `min_state` are not followed.
pub fn follow_all(
    cells: &mut [AutomatonCell],
    relations: &[WeightedRelation],
    min_state: f64,
) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..cells.len()).collect();
    order.sort_by(|&a, &b| cells[b].state.total_cmp(&cells[a].state));

    let mut paths = Vec::new();
    for start in order {
        if cells[start].state < min_state {
            break;
        }
        if cells[start].has(AutomatonCell::ASSIGNED) || cells[start].is_blocked() {
            continue;
        }
        let path = follow_from(start, cells, relations);
        for &i in &path {
            cells[i].set(AutomatonCell::ASSIGNED);
        }
        paths.push(path);
    }
    paths
}

fn follow_from(
    start: usize,
    cells: &[AutomatonCell],
    relations: &[WeightedRelation],
) -> Vec<usize> {
    let mut path = vec![start];
    let mut current = start;
    'grow: loop {
        for relation in relations_from(relations, current) {
            let to = relation.to;
            if cells[to].has(AutomatonCell::ASSIGNED) || cells[to].is_blocked() {
                continue;
            }
            // Exact float equality is sound here: the state was computed
            // from exactly this sum during the automaton pass.
            if cells[current].state == cells[current].weight + relation.weight + cells[to].state {
                path.push(to);
                current = to;
                continue 'grow;
            }
        }
        return path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::{sort_relations, CellularAutomaton};

    #[test]
    fn follows_the_longest_chain_and_marks_it_assigned() {
        // 0 -> 1 -> 2 and a short spur 3 -> 1.
        let mut cells: Vec<AutomatonCell> =
            (0..4).map(|_| AutomatonCell::with_weight(3.0)).collect();
        let mut rels = vec![
            WeightedRelation::accept(0, -2.0, 1).unwrap(),
            WeightedRelation::accept(1, -2.0, 2).unwrap(),
            WeightedRelation::accept(3, -2.0, 1).unwrap(),
        ];
        sort_relations(&mut rels);
        CellularAutomaton::new().assign_states(&mut cells, &rels);
        let paths = follow_all(&mut cells, &rels, f64::NEG_INFINITY);
        assert_eq!(paths[0], vec![0, 1, 2]);
        // The spur can no longer continue through cell 1.
        assert!(paths.iter().any(|p| p == &vec![3]));
    }

    #[test]
    fn min_state_cuts_off_weak_starts() {
        let mut cells: Vec<AutomatonCell> =
            (0..2).map(|_| AutomatonCell::with_weight(1.0)).collect();
        let rels = Vec::new();
        CellularAutomaton::new().assign_states(&mut cells, &rels);
        let paths = follow_all(&mut cells, &rels, 2.0);
        assert!(paths.is_empty());
    }
}
