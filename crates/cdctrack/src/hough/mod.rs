//! The Legendre finder: a quad-tree Hough search over the conformal
//! (angle, curvature) space that seeds track candidates from axial hits.

mod conformal;
mod quadtree;

pub use conformal::ConformalHit;
pub use quadtree::{crosses_box, search_leaves, LeafBox};

use serde::{Deserialize, Serialize};

use crate::eventdata::HitArena;
use crate::fitting::{fit_circle, CircleFit};
use crate::geometry::{normalize_angle, PerigeeCircle};
use crate::topology::CdcLayout;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendreConfig {
    /// Hard bound on the subdivision depth.
    pub max_depth: usize,
    /// Minimum hit occupancy below which a box is pruned; also the
    /// minimum size of an emitted seed.
    pub min_leaf_hits: usize,
    /// Half-range of the signed curvature axis (1/cm).
    pub curv_max: f64,
    /// Curvature resolution floor at zero curvature (1/cm).
    pub curv_resolution: f64,
    /// Linear growth of the resolution floor with the box curvature.
    pub curv_resolution_scale: f64,
    /// Seeds sharing more than this fraction of hits with an already
    /// accepted seed are dropped.
    pub max_seed_overlap: f64,
}

impl Default for LegendreConfig {
    fn default() -> Self {
        Self {
            max_depth: 12,
            min_leaf_hits: 10,
            curv_max: 0.05,
            curv_resolution: 2e-4,
            curv_resolution_scale: 20.0,
            max_seed_overlap: 0.5,
        }
    }
}

/// A deduplicated dense leaf promoted to a track seed: the box center as
/// a raw parameter estimate plus a proper circle fit over its hits.
#[derive(Debug, Clone)]
pub struct AxialSeed {
    /// Center-azimuth estimate from the leaf box.
    pub theta: f64,
    /// Signed curvature estimate from the leaf box.
    pub curvature: f64,
    /// Hit arena indices, ordered along the seed trajectory.
    pub hits: Vec<usize>,
    pub fit: CircleFit,
}

/// Trajectory implied by a parameter-space point, for ordering hits
/// before the fit: a circle through the origin with center at azimuth
/// `theta` and signed curvature `curvature`.
pub fn seed_circle(theta: f64, curvature: f64) -> PerigeeCircle {
    PerigeeCircle::new(
        curvature,
        normalize_angle(theta - std::f64::consts::FRAC_PI_2),
        0.0,
    )
}

/// Run the Legendre search over the usable axial hits of the arena.
pub fn find_axial_seeds(
    arena: &HitArena,
    layout: &CdcLayout,
    config: &LegendreConfig,
) -> Vec<AxialSeed> {
    let candidates = arena.usable_axial_hits(layout);
    let conformal: Vec<ConformalHit> = candidates
        .iter()
        .map(|&i| ConformalHit::new(arena.hits[i].ref_pos, arena.hits[i].drift_length))
        .collect();

    let leaves = search_leaves(&conformal, config);
    tracing::debug!(
        n_candidates = candidates.len(),
        n_leaves = leaves.len(),
        "quad-tree search finished"
    );

    let mut seeds: Vec<AxialSeed> = Vec::new();
    for leaf in &leaves {
        let hits: Vec<usize> = leaf.hits.iter().map(|&i| candidates[i]).collect();
        if is_duplicate(&hits, &seeds, config.max_seed_overlap) {
            continue;
        }
        if let Some(seed) = build_seed(leaf, hits, arena) {
            seeds.push(seed);
        }
    }
    tracing::debug!(n_seeds = seeds.len(), "axial seeds after dedup");
    seeds
}

/// Overlap dedup: leaves come ranked by occupancy, so the first seed a
/// hit set matches is the best one.
fn is_duplicate(hits: &[usize], accepted: &[AxialSeed], max_overlap: f64) -> bool {
    accepted.iter().any(|seed| {
        let shared = hits.iter().filter(|i| seed.hits.contains(i)).count();
        let denom = hits.len().min(seed.hits.len()).max(1);
        shared as f64 / denom as f64 > max_overlap
    })
}

fn build_seed(leaf: &LeafBox, mut hits: Vec<usize>, arena: &HitArena) -> Option<AxialSeed> {
    let theta = leaf.theta_center();
    let curvature = leaf.curvature_center();
    let reference = seed_circle(theta, curvature);
    hits.sort_by(|&a, &b| {
        reference
            .arc_length(arena.hits[a].ref_pos)
            .total_cmp(&reference.arc_length(arena.hits[b].ref_pos))
    });

    let positions: Vec<_> = hits.iter().map(|&i| arena.hits[i].ref_pos).collect();
    // Drift side is unknown at this stage: the wire position is off the
    // trajectory by up to the drift length, which dominates the weight.
    let sigmas: Vec<f64> = hits
        .iter()
        .map(|&i| {
            let h = &arena.hits[i];
            (h.drift_length * h.drift_length + h.drift_variance).sqrt().max(1e-3)
        })
        .collect();
    let fit = fit_circle(&positions, &sigmas)?;
    Some(AxialSeed {
        theta,
        curvature,
        hits,
        fit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventdata::{EventRecord, HitRecord};
    use crate::geometry::Helix;
    use crate::sim::{simulate_track, SimConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn seed_circle_reproduces_the_sinogram_relation() {
        for &(theta, kappa) in &[(0.7, 0.02), (2.1, -0.03)] {
            let circle = seed_circle(theta, kappa);
            // Passes through the origin with the requested curvature.
            assert!(circle.impact.abs() < 1e-12);
            assert!((circle.curvature - kappa).abs() < 1e-12);
            let center = circle.center();
            let center_phi = center.y.atan2(center.x).rem_euclid(std::f64::consts::TAU);
            let expected = if kappa > 0.0 {
                theta
            } else {
                (theta + std::f64::consts::PI) % std::f64::consts::TAU
            };
            assert!((center_phi - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn one_simulated_track_gives_one_seed() {
        let layout = CdcLayout::default();
        let helix = Helix::new(0.012, 0.9, 0.0, 0.2, 0.0);
        let mut rng = StdRng::seed_from_u64(11);
        let records: Vec<HitRecord> =
            simulate_track(&helix, 0, &layout, &SimConfig::noiseless(), &mut rng);
        let arena = HitArena::prepare(&EventRecord { hits: records }, &layout);
        let config = LegendreConfig {
            min_leaf_hits: 10,
            ..LegendreConfig::default()
        };
        let seeds = find_axial_seeds(&arena, &layout, &config);
        assert_eq!(seeds.len(), 1);
        // All axial hits of the track are picked up.
        assert!(seeds[0].hits.len() >= 20);
        assert!((seeds[0].fit.circle.curvature - 0.012).abs() < 2e-3);
    }
}
