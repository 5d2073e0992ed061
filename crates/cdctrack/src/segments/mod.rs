//! Segment building: facets chained into per-super-layer segments by the
//! cellular automaton.

mod facets;

pub use facets::{create_facets, fit_tangent};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ca::{follow_all, sort_relations, CellularAutomaton, WeightedRelation};
use crate::clustering::Cluster;
use crate::eventdata::{Facet, HitArena, Segment2d};
use crate::filters::{FacetFilter, FacetRelationFilter, McTruth};
use crate::fitting::fit_circle_with_drift;
use crate::topology::CdcLayout;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetConfig {
    /// Filter variant for facet acceptance.
    pub filter: String,
    /// Upper cut on the tangent-line fit chi-square.
    pub chi2_cut: f64,
    /// Cell weight of an accepted facet.
    pub weight: f64,
    /// Maximum cell-index distance between the wires of a facet.
    pub wire_window: u16,
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            filter: "simple".into(),
            chi2_cut: 75.0,
            weight: 3.0,
            wire_window: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetRelationConfig {
    /// Filter variant for facet continuations.
    pub filter: String,
    /// Maximum tangent direction change between chained facets (rad).
    pub max_deflection: f64,
    /// Relation weight; negative so path states count distinct hits.
    pub weight: f64,
}

impl Default for FacetRelationConfig {
    fn default() -> Self {
        Self {
            filter: "simple".into(),
            max_deflection: 0.4,
            weight: -2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Minimum number of hits in an extracted segment.
    pub min_hits: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self { min_hits: 4 }
    }
}

/// Build 2D segments from the clusters of one event.
///
/// With the default facet weight 3 and relation weight -2, a path's
/// automaton state equals the number of distinct hits on it, so the
/// minimum-hit cut translates directly into the follower's state cut.
pub fn find_segments(
    clusters: &[Cluster],
    arena: &HitArena,
    layout: &CdcLayout,
    facet_filter: &FacetFilter,
    relation_filter: &FacetRelationFilter,
    truth: Option<&McTruth>,
    facet_config: &FacetConfig,
    segment_config: &SegmentConfig,
) -> Vec<Segment2d> {
    let mut facets: Vec<Facet> = Vec::new();
    for (ci, cluster) in clusters.iter().enumerate() {
        facets.extend(create_facets(
            ci,
            cluster,
            arena,
            layout,
            facet_filter,
            truth,
            facet_config,
        ));
    }

    let mut relations = facet_relations(&facets, relation_filter, truth);
    sort_relations(&mut relations);

    let mut cells: Vec<_> = facets.iter().map(|f| f.cell).collect();
    CellularAutomaton::new().assign_states(&mut cells, &relations);

    let min_facets = segment_config.min_hits.saturating_sub(2).max(1);
    let min_state = facet_config.weight * min_facets as f64
        + relation_filter_weight_floor(min_facets, &relations);
    let paths = follow_all(&mut cells, &relations, min_state);
    tracing::debug!(
        n_facets = facets.len(),
        n_relations = relations.len(),
        n_paths = paths.len(),
        "facet automaton finished"
    );

    let mut segments = Vec::new();
    for path in paths {
        if let Some(segment) = segment_from_path(&path, &facets, clusters, arena) {
            segments.push(segment);
        }
    }
    segments
}

/// Continuation relations between facets of the same cluster.
fn facet_relations(
    facets: &[Facet],
    filter: &FacetRelationFilter,
    truth: Option<&McTruth>,
) -> Vec<WeightedRelation> {
    // Index facets by their leading hit pair for O(1) continuation lookup.
    let mut by_start: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (i, facet) in facets.iter().enumerate() {
        by_start.entry((facet.start, facet.middle)).or_default().push(i);
    }

    let mut relations = Vec::new();
    for (i, facet) in facets.iter().enumerate() {
        let Some(continuations) = by_start.get(&(facet.middle, facet.end)) else {
            continue;
        };
        for &j in continuations {
            debug_assert!(facet.is_continued_by(&facets[j]));
            let weight = filter.score(facet, &facets[j], truth);
            relations.extend(WeightedRelation::accept(i, weight, j));
        }
    }
    relations
}

/// Most negative achievable relation contribution for a path of
/// `min_facets` facets, so the state cut never rejects a path that meets
/// the hit count with the configured weights.
fn relation_filter_weight_floor(min_facets: usize, relations: &[WeightedRelation]) -> f64 {
    let worst = relations
        .iter()
        .map(|r| r.weight)
        .fold(0.0f64, f64::min);
    worst * min_facets.saturating_sub(1) as f64
}

/// Stitch the hit sequence of a facet path into a fitted segment.
fn segment_from_path(
    path: &[usize],
    facets: &[Facet],
    clusters: &[Cluster],
    arena: &HitArena,
) -> Option<Segment2d> {
    let first = &facets[*path.first()?];
    let mut hits = vec![first.start, first.middle];
    let mut rl = vec![first.rl[0], first.rl[1]];
    for &fi in path {
        hits.push(facets[fi].end);
        rl.push(facets[fi].rl[2]);
    }

    let positions: Vec<_> = hits.iter().map(|&i| arena.hits[i].ref_pos).collect();
    let drifts: Vec<f64> = hits.iter().map(|&i| arena.hits[i].drift_length).collect();
    let rl_signs: Vec<f64> = rl.iter().map(|r| r.sign()).collect();
    let sigmas: Vec<f64> = hits.iter().map(|&i| arena.hits[i].drift_sigma()).collect();
    let fit = fit_circle_with_drift(&positions, &drifts, &rl_signs, &sigmas)?;

    let superlayer = clusters[first.cluster].superlayer;
    Some(Segment2d {
        hits,
        rl,
        superlayer,
        fit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{find_clusters, ClusteringConfig};
    use crate::eventdata::EventRecord;
    use crate::filters::FilterChoice;
    use crate::geometry::Helix;
    use crate::sim::{simulate_track, SimConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn segments_of_helix(helix: &Helix) -> (Vec<Segment2d>, HitArena, CdcLayout) {
        let layout = CdcLayout::default();
        let mut rng = StdRng::seed_from_u64(21);
        let records = simulate_track(helix, 0, &layout, &SimConfig::noiseless(), &mut rng);
        let mut arena = HitArena::prepare(&EventRecord { hits: records }, &layout);
        let clusters = find_clusters(&mut arena, &layout, &ClusteringConfig::default());
        let facet_config = FacetConfig::default();
        let facet_filter = FacetFilter::new(FilterChoice::Simple, facet_config.chi2_cut, 3.0);
        let relation_filter = FacetRelationFilter::new(FilterChoice::Simple, 0.4, -2.0);
        let segments = find_segments(
            &clusters,
            &arena,
            &layout,
            &facet_filter,
            &relation_filter,
            None,
            &facet_config,
            &SegmentConfig::default(),
        );
        (segments, arena, layout)
    }

    #[test]
    fn one_track_yields_one_segment_per_crossed_superlayer() {
        let helix = Helix::new(0.008, 0.5, 0.0, 0.1, 0.0);
        let (segments, arena, layout) = segments_of_helix(&helix);
        assert_eq!(segments.len(), layout.n_superlayers());
        for segment in &segments {
            assert_eq!(segment.len(), 6);
            // The fitted circle tracks the generated curvature loosely;
            // a six-hit arc inside one super-layer is a short lever arm.
            assert!(segment.fit.circle.curvature.abs() < 0.05);
            // Hits are ordered along increasing continuous layer.
            let layers: Vec<u16> = segment.hits.iter().map(|&i| arena.hits[i].clayer).collect();
            assert!(layers.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn drift_side_assignment_is_consistent_along_the_segment() {
        let helix = Helix::new(0.008, 0.5, 0.0, 0.1, 0.0);
        let (segments, arena, _) = segments_of_helix(&helix);
        for segment in &segments {
            for (&hit, rl) in segment.hits.iter().zip(&segment.rl) {
                let d = segment.fit.circle.distance(arena.hits[hit].ref_pos);
                let expected = rl.sign() * arena.hits[hit].drift_length;
                assert!(
                    (d - expected).abs() < 0.05,
                    "residual {d} vs {expected}"
                );
            }
        }
    }

    #[test]
    fn rejecting_filter_yields_no_segments() {
        let layout = CdcLayout::default();
        let mut rng = StdRng::seed_from_u64(22);
        let helix = Helix::new(0.008, 0.5, 0.0, 0.1, 0.0);
        let records = simulate_track(&helix, 0, &layout, &SimConfig::noiseless(), &mut rng);
        let mut arena = HitArena::prepare(&EventRecord { hits: records }, &layout);
        let clusters = find_clusters(&mut arena, &layout, &ClusteringConfig::default());
        let facet_config = FacetConfig::default();
        let facet_filter = FacetFilter::new(FilterChoice::None, 75.0, 3.0);
        let relation_filter = FacetRelationFilter::new(FilterChoice::Simple, 0.4, -2.0);
        let segments = find_segments(
            &clusters,
            &arena,
            &layout,
            &facet_filter,
            &relation_filter,
            None,
            &facet_config,
            &SegmentConfig::default(),
        );
        assert!(segments.is_empty());
    }
}
