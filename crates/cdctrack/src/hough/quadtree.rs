//! Recursive quad-tree search over the (angle, curvature) parameter box.

use super::conformal::ConformalHit;
use super::LegendreConfig;

/// One rectangular parameter sub-box with the hits whose sinogram bands
/// cross it. Node state is owned per search pass; nothing is reused
/// across events.
#[derive(Debug, Clone)]
pub struct LeafBox {
    pub theta: (f64, f64),
    pub curvature: (f64, f64),
    /// Indices into the candidate list handed to [`search_leaves`].
    pub hits: Vec<usize>,
}

impl LeafBox {
    pub fn theta_center(&self) -> f64 {
        0.5 * (self.theta.0 + self.theta.1)
    }

    pub fn curvature_center(&self) -> f64 {
        0.5 * (self.curvature.0 + self.curvature.1)
    }
}

/// Whether the hit's sinogram band crosses the box.
///
/// Both drift-shifted curves are tested independently; a curve crosses
/// when its signed distances to the box's curvature bounds do not all
/// share one sign over the corners (plus the interior extremum of the
/// sinusoid when it falls inside the angle range). Exact zeros count as
/// crossings on both sides, so a hit on a child boundary lands in both
/// children.
pub fn crosses_box(hit: &ConformalHit, theta: (f64, f64), curvature: (f64, f64)) -> bool {
    let mut angles = [theta.0, theta.1, f64::NAN, f64::NAN];
    let extremum = hit.extremum_angle();
    let mut n_angles = 2;
    for candidate in [extremum, (extremum + std::f64::consts::PI) % std::f64::consts::TAU] {
        if candidate > theta.0 && candidate < theta.1 {
            angles[n_angles] = candidate;
            n_angles += 1;
        }
    }

    for side in [1.0, -1.0] {
        let mut has_non_negative = false;
        let mut has_non_positive = false;
        for &angle in &angles[..n_angles] {
            for kappa in [curvature.0, curvature.1] {
                let d = hit.sinogram_distance(angle, kappa, side);
                has_non_negative |= d >= 0.0;
                has_non_positive |= d <= 0.0;
            }
        }
        if has_non_negative && has_non_positive {
            return true;
        }
    }
    false
}

/// Run the recursive subdivision and collect the accepted leaves.
///
/// `hits` is the candidate list; leaves reference candidates by index.
/// Recursion is bounded by the configured maximum depth as a hard
/// invariant, so the search terminates for any input.
pub fn search_leaves(hits: &[ConformalHit], config: &LegendreConfig) -> Vec<LeafBox> {
    let root_theta = (0.0, std::f64::consts::PI);
    let root_curv = (-config.curv_max, config.curv_max);
    let root_hits: Vec<usize> = (0..hits.len())
        .filter(|&i| crosses_box(&hits[i], root_theta, root_curv))
        .collect();

    let mut leaves = Vec::new();
    descend(
        hits,
        config,
        LeafBox {
            theta: root_theta,
            curvature: root_curv,
            hits: root_hits,
        },
        0,
        &mut leaves,
    );
    leaves.sort_by(|a, b| b.hits.len().cmp(&a.hits.len()));
    leaves
}

fn descend(
    hits: &[ConformalHit],
    config: &LegendreConfig,
    node: LeafBox,
    depth: usize,
    leaves: &mut Vec<LeafBox>,
) {
    if node.hits.len() < config.min_leaf_hits {
        // Sparse box: prune the whole subtree.
        return;
    }
    if depth >= config.max_depth || curvature_width_resolved(&node, config) {
        leaves.push(node);
        return;
    }

    let theta_mid = node.theta_center();
    let curv_mid = node.curvature_center();
    let theta_halves = [(node.theta.0, theta_mid), (theta_mid, node.theta.1)];
    let curv_halves = [(node.curvature.0, curv_mid), (curv_mid, node.curvature.1)];
    for &theta in &theta_halves {
        for &curvature in &curv_halves {
            // Every hit is re-tested against each child independently;
            // hits near the split land in more than one child.
            let child_hits: Vec<usize> = node
                .hits
                .iter()
                .copied()
                .filter(|&i| crosses_box(&hits[i], theta, curvature))
                .collect();
            descend(
                hits,
                config,
                LeafBox {
                    theta,
                    curvature,
                    hits: child_hits,
                },
                depth + 1,
                leaves,
            );
        }
    }
}

/// Curvature-dependent resolution floor: high-curvature (low momentum)
/// regions need less precision than the near-straight region.
fn curvature_width_resolved(node: &LeafBox, config: &LegendreConfig) -> bool {
    let width = node.curvature.1 - node.curvature.0;
    let floor =
        config.curv_resolution * (1.0 + config.curv_resolution_scale * node.curvature_center().abs());
    width <= floor
}
