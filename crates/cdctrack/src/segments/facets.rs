//! Facet creation: adjacent-layer hit triples with a tangent-line fit.

use nalgebra::Vector2;

use crate::ca::AutomatonCell;
use crate::clustering::Cluster;
use crate::eventdata::{Facet, HitArena, RlInfo};
use crate::filters::{FacetFilter, McTruth};
use crate::topology::{circular_wire_distance, CdcLayout};

use super::FacetConfig;

const RL_COMBOS: [[RlInfo; 3]; 8] = {
    use RlInfo::{Left as L, Right as R};
    [
        [R, R, R],
        [R, R, L],
        [R, L, R],
        [R, L, L],
        [L, R, R],
        [L, R, L],
        [L, L, R],
        [L, L, L],
    ]
};

/// Enumerate and score the facets of one cluster.
///
/// Triples span three consecutive continuous layers with neighboring
/// wires, so the continuation graph is a DAG by construction (a facet's
/// end layer is strictly beyond its start layer). Each candidate gets
/// the drift-side combination with the best tangent fit, then passes
/// through the facet filter; a cluster where no facet is accepted
/// yields none, which is an ordinary outcome.
pub fn create_facets(
    cluster_index: usize,
    cluster: &Cluster,
    arena: &HitArena,
    layout: &CdcLayout,
    filter: &FacetFilter,
    truth: Option<&McTruth>,
    config: &FacetConfig,
) -> Vec<Facet> {
    let n_wires = layout.superlayer(cluster.superlayer).n_wires;
    let mut facets = Vec::new();
    for &start in &cluster.hits {
        for &middle in &cluster.hits {
            if arena.hits[middle].clayer != arena.hits[start].clayer + 1 {
                continue;
            }
            if !wires_adjacent(arena, start, middle, n_wires, config.wire_window) {
                continue;
            }
            for &end in &cluster.hits {
                if arena.hits[end].clayer != arena.hits[middle].clayer + 1 {
                    continue;
                }
                if !wires_adjacent(arena, middle, end, n_wires, config.wire_window) {
                    continue;
                }
                let mut facet = fit_facet(cluster_index, start, middle, end, arena);
                let weight = filter.score(&facet, arena, truth);
                if let Some(cell) = weight.is_finite().then(|| AutomatonCell::with_weight(weight))
                {
                    facet.cell = cell;
                    facets.push(facet);
                }
            }
        }
    }
    facets
}

fn wires_adjacent(arena: &HitArena, a: usize, b: usize, n_wires: u16, window: u16) -> bool {
    circular_wire_distance(arena.hits[a].wire.wire, arena.hits[b].wire.wire, n_wires) <= window
}

/// Build the facet with the best drift-side combination.
fn fit_facet(cluster: usize, start: usize, middle: usize, end: usize, arena: &HitArena) -> Facet {
    let positions = [
        arena.hits[start].ref_pos,
        arena.hits[middle].ref_pos,
        arena.hits[end].ref_pos,
    ];
    let drifts = [
        arena.hits[start].drift_length,
        arena.hits[middle].drift_length,
        arena.hits[end].drift_length,
    ];
    let sigmas = [
        arena.hits[start].drift_sigma(),
        arena.hits[middle].drift_sigma(),
        arena.hits[end].drift_sigma(),
    ];

    let mut best_rl = RL_COMBOS[0];
    let mut best_phi = 0.0;
    let mut best_chi2 = f64::INFINITY;
    for combo in RL_COMBOS {
        let (phi, chi2) = fit_tangent(&positions, &drifts, &sigmas, combo);
        if chi2 < best_chi2 {
            best_chi2 = chi2;
            best_phi = phi;
            best_rl = combo;
        }
    }

    Facet {
        start,
        middle,
        end,
        rl: best_rl,
        tangent_phi: best_phi,
        fit_chi2: best_chi2,
        cluster,
        cell: AutomatonCell::with_weight(0.0),
    }
}

/// Weighted tangent line to three drift circles for a fixed drift-side
/// combination. Returns the line direction angle (oriented from the
/// first towards the last hit) and the fit chi-square.
///
/// The drift displacement depends on the line normal, so the fit
/// alternates displacement and a total-least-squares refit; the drifts
/// are small against the wire spacing and two refinements converge.
pub fn fit_tangent(
    positions: &[Vector2<f64>; 3],
    drifts: &[f64; 3],
    sigmas: &[f64; 3],
    rl: [RlInfo; 3],
) -> (f64, f64) {
    let weights = [
        1.0 / (sigmas[0] * sigmas[0]),
        1.0 / (sigmas[1] * sigmas[1]),
        1.0 / (sigmas[2] * sigmas[2]),
    ];
    let mut points = *positions;
    let mut dir = line_direction(&points, &weights, positions);
    for _ in 0..3 {
        let normal = Vector2::new(-dir.y, dir.x);
        for i in 0..3 {
            points[i] = positions[i] - normal * (rl[i].sign() * drifts[i]);
        }
        dir = line_direction(&points, &weights, positions);
    }

    let normal = Vector2::new(-dir.y, dir.x);
    let (mut w_sum, mut offset) = (0.0, 0.0);
    for i in 0..3 {
        w_sum += weights[i];
        offset += weights[i] * (normal.dot(&positions[i]) - rl[i].sign() * drifts[i]);
    }
    let offset = offset / w_sum;
    let chi2: f64 = (0..3)
        .map(|i| {
            let r = normal.dot(&positions[i]) - offset - rl[i].sign() * drifts[i];
            weights[i] * r * r
        })
        .sum();
    (dir.y.atan2(dir.x), chi2)
}

/// Weighted total-least-squares direction, oriented along the hit order.
fn line_direction(
    points: &[Vector2<f64>; 3],
    weights: &[f64; 3],
    order_hint: &[Vector2<f64>; 3],
) -> Vector2<f64> {
    let w_sum: f64 = weights.iter().sum();
    let mut mean = Vector2::zeros();
    for i in 0..3 {
        mean += points[i] * weights[i];
    }
    mean /= w_sum;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for i in 0..3 {
        let d = points[i] - mean;
        sxx += weights[i] * d.x * d.x;
        sxy += weights[i] * d.x * d.y;
        syy += weights[i] * d.y * d.y;
    }
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let mut dir = Vector2::new(theta.cos(), theta.sin());
    if dir.dot(&(order_hint[2] - order_hint[0])) < 0.0 {
        dir = -dir;
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_fit_finds_the_common_tangent() {
        // Three wires on a horizontal row, all drift circles touching the
        // line y = 0.1 from below.
        let positions = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(2.0, 0.0),
        ];
        let drifts = [0.1, 0.1, 0.1];
        let sigmas = [0.01, 0.01, 0.01];
        use RlInfo::{Left as L, Right as R};
        // Trajectory above the wires, flying towards +x: wires on the right.
        let (phi, chi2) = fit_tangent(&positions, &drifts, &sigmas, [R, R, R]);
        assert!(chi2 < 1e-12);
        assert!(phi.abs() < 1e-9);
        // A mixed combination cannot touch all three circles with one line.
        let (_, chi2_mixed) = fit_tangent(&positions, &drifts, &sigmas, [R, L, R]);
        assert!(chi2_mixed > chi2 + 1.0);
    }

    #[test]
    fn best_combo_matches_the_geometry() {
        // Middle wire displaced upward: the tangent line passes between
        // middle and the outer two, so the middle drift side differs.
        let positions = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.2),
            Vector2::new(2.0, 0.0),
        ];
        let drifts = [0.1, 0.1, 0.1];
        let sigmas = [0.01, 0.01, 0.01];
        let mut best = (f64::INFINITY, [RlInfo::Left; 3]);
        for combo in RL_COMBOS {
            let (_, chi2) = fit_tangent(&positions, &drifts, &sigmas, combo);
            if chi2 < best.0 {
                best = (chi2, combo);
            }
        }
        assert_ne!(best.1[0], best.1[1]);
        assert_eq!(best.1[0], best.1[2]);
    }
}
