//! State assignment over the relation graph.

use super::{relations_from, AutomatonCell, WeightedRelation};

/// Assigns to every cell the best achievable path score
/// `state = weight + max(relation_weight + state(successor))`,
/// or just `weight` for cells without usable successors.
///
/// The relation graph is a DAG by construction (successors always sit at
/// strictly later wire layers); cycles indicate a wiring error upstream
/// and are broken by flagging the offending cells with
/// [`AutomatonCell::CYCLE`], which removes them from path extraction.
#[derive(Debug, Default)]
pub struct CellularAutomaton {
    // 0 = untouched, 1 = on the current descent, 2 = finalized
    marks: Vec<u8>,
}

impl CellularAutomaton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one state-assignment pass. `relations` must be sorted with
    /// [`super::sort_relations`].
    pub fn assign_states(&mut self, cells: &mut [AutomatonCell], relations: &[WeightedRelation]) {
        self.marks.clear();
        self.marks.resize(cells.len(), 0);
        for start in 0..cells.len() {
            if self.marks[start] == 0 && !cells[start].is_blocked() {
                self.descend(start, cells, relations);
            }
        }
    }

    fn descend(&mut self, index: usize, cells: &mut [AutomatonCell], rels: &[WeightedRelation]) {
        self.marks[index] = 1;
        let mut best: Option<f64> = None;
        // Iterate over a local copy of the outgoing slice bounds to keep
        // the borrow checker off the recursive call.
        let outgoing: Vec<WeightedRelation> = relations_from(rels, index).to_vec();
        for relation in outgoing {
            let to = relation.to;
            if cells[to].is_blocked() {
                continue;
            }
            match self.marks[to] {
                0 => self.descend(to, cells, rels),
                1 => {
                    // Back edge: the graph is not a DAG here.
                    cells[to].set(AutomatonCell::CYCLE);
                    continue;
                }
                _ => {}
            }
            if cells[to].has(AutomatonCell::CYCLE) {
                continue;
            }
            let continuation = relation.weight + cells[to].state;
            best = Some(match best {
                Some(b) if b >= continuation => b,
                _ => continuation,
            });
        }
        cells[index].state = cells[index].weight + best.unwrap_or(0.0);
        self.marks[index] = 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::sort_relations;

    fn cells(weights: &[f64]) -> Vec<AutomatonCell> {
        weights.iter().map(|&w| AutomatonCell::with_weight(w)).collect()
    }

    #[test]
    fn chain_accumulates_weights_and_relations() {
        // 0 -> 1 -> 2, cell weight 3, relation weight -2: states 5, 4, 3.
        let mut c = cells(&[3.0, 3.0, 3.0]);
        let mut rels = vec![
            WeightedRelation::accept(0, -2.0, 1).unwrap(),
            WeightedRelation::accept(1, -2.0, 2).unwrap(),
        ];
        sort_relations(&mut rels);
        CellularAutomaton::new().assign_states(&mut c, &rels);
        assert_eq!(c[2].state, 3.0);
        assert_eq!(c[1].state, 4.0);
        assert_eq!(c[0].state, 5.0);
    }

    #[test]
    fn branching_takes_the_better_continuation() {
        let mut c = cells(&[1.0, 1.0, 5.0]);
        let mut rels = vec![
            WeightedRelation::accept(0, 0.0, 1).unwrap(),
            WeightedRelation::accept(0, 0.0, 2).unwrap(),
        ];
        sort_relations(&mut rels);
        CellularAutomaton::new().assign_states(&mut c, &rels);
        assert_eq!(c[0].state, 6.0);
    }

    #[test]
    fn cycles_are_flagged_not_followed() {
        let mut c = cells(&[1.0, 1.0]);
        let mut rels = vec![
            WeightedRelation::accept(0, 0.0, 1).unwrap(),
            WeightedRelation::accept(1, 0.0, 0).unwrap(),
        ];
        sort_relations(&mut rels);
        CellularAutomaton::new().assign_states(&mut c, &rels);
        assert!(c[0].has(AutomatonCell::CYCLE) || c[1].has(AutomatonCell::CYCLE));
        // States stay finite and the pass terminates.
        assert!(c[0].state.is_finite() && c[1].state.is_finite());
    }

    #[test]
    fn masked_cells_do_not_contribute() {
        let mut c = cells(&[1.0, 100.0]);
        c[1].set(AutomatonCell::MASKED);
        let mut rels = vec![WeightedRelation::accept(0, 0.0, 1).unwrap()];
        sort_relations(&mut rels);
        CellularAutomaton::new().assign_states(&mut c, &rels);
        assert_eq!(c[0].state, 1.0);
    }
}
