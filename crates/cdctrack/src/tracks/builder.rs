//! Track building: axial-stereo segment pairs chained by a second
//! cellular automaton, plus leftover Legendre seeds.

use crate::ca::{follow_all, sort_relations, AutomatonCell, CellularAutomaton, WeightedRelation};
use crate::eventdata::{HitArena, Segment2d, Track, WireHit};
use crate::filters::{McTruth, SegmentPairFilter};
use crate::fitting::{fit_circle_with_drift, fuse_axial_stereo, reconstruct_on_circle, CircleFit};
use crate::geometry::{Helix, HelixCovariance, UncertainHelix};
use crate::hough::AxialSeed;
use crate::topology::CdcLayout;

use super::{CleanupConfig, SegmentPairConfig};

/// A fused pair of segments in adjacent super-layers, one axial and one
/// stereo.
#[derive(Debug, Clone)]
pub struct SegmentPair {
    pub inner: usize,
    pub outer: usize,
    pub fused: UncertainHelix,
    pub cell: AutomatonCell,
}

/// Build track candidates: segment-pair chains first, then leftover
/// Legendre seeds that the segment stage did not cover.
///
/// Candidates may still overlap in hits; the cleanup stage reconciles
/// ownership.
pub fn build_tracks(
    segments: &[Segment2d],
    seeds: &[AxialSeed],
    arena: &HitArena,
    layout: &CdcLayout,
    pair_filter: &SegmentPairFilter,
    truth: Option<&McTruth>,
    pair_config: &SegmentPairConfig,
    cleanup_config: &CleanupConfig,
) -> Vec<Track> {
    let pairs = build_pairs(segments, arena, layout, pair_filter, truth, pair_config);
    let mut relations = pair_relations(&pairs, segments);
    sort_relations(&mut relations);

    let mut cells: Vec<_> = pairs.iter().map(|p| p.cell).collect();
    CellularAutomaton::new().assign_states(&mut cells, &relations);
    let paths = follow_all(&mut cells, &relations, 0.0);
    tracing::debug!(
        n_pairs = pairs.len(),
        n_pair_relations = relations.len(),
        n_paths = paths.len(),
        "segment-pair automaton finished"
    );

    let mut tracks = Vec::new();
    let mut claimed = vec![false; arena.len()];
    for path in paths {
        if let Some(track) =
            track_from_pair_path(&path, &pairs, segments, arena, layout, pair_config)
        {
            for reco in &track.reco_hits {
                claimed[reco.hit] = true;
            }
            tracks.push(track);
        }
    }

    // Leftover seeds: Legendre candidates whose hits the segment stage
    // left unclaimed, typically sparse tracks with too few facets.
    for seed in seeds {
        let fresh = seed.hits.iter().filter(|&&i| !claimed[i]).count();
        let fraction = fresh as f64 / seed.hits.len().max(1) as f64;
        if fraction < 1.0 - cleanup_config.clone_overlap {
            continue;
        }
        if let Some(track) = track_from_seed(seed, arena, layout, &claimed, pair_config) {
            for reco in &track.reco_hits {
                claimed[reco.hit] = true;
            }
            tracks.push(track);
        }
    }
    tracing::debug!(n_candidates = tracks.len(), "track candidates built");
    tracks
}

fn build_pairs(
    segments: &[Segment2d],
    arena: &HitArena,
    layout: &CdcLayout,
    filter: &SegmentPairFilter,
    truth: Option<&McTruth>,
    config: &SegmentPairConfig,
) -> Vec<SegmentPair> {
    let mut pairs = Vec::new();
    for (i, inner) in segments.iter().enumerate() {
        for (j, outer) in segments.iter().enumerate() {
            if outer.superlayer != inner.superlayer + 1 {
                continue;
            }
            // Exactly one of the two super-layers must be axial.
            let inner_axial = layout.is_axial(inner.superlayer);
            if inner_axial == layout.is_axial(outer.superlayer) {
                continue;
            }
            let (axial, stereo) = if inner_axial { (inner, outer) } else { (outer, inner) };
            let stereo_hits: Vec<(usize, &WireHit)> = stereo
                .hits
                .iter()
                .map(|&h| (h, &arena.hits[h]))
                .collect();
            let fused = fuse_axial_stereo(&axial.fit, &stereo_hits, layout, config.iterations);

            let hits: Vec<usize> = inner.hits.iter().chain(&outer.hits).copied().collect();
            let weight = filter.score(fused.as_ref(), &hits, arena, truth);
            let (Some(fused), true) = (fused, weight.is_finite()) else {
                continue;
            };
            pairs.push(SegmentPair {
                inner: i,
                outer: j,
                fused,
                cell: AutomatonCell::with_weight(weight),
            });
        }
    }
    pairs
}

/// Chain relation: two pairs sharing their middle segment. The weight
/// discounts the shared segment's hits, which both pair weights count.
fn pair_relations(pairs: &[SegmentPair], segments: &[Segment2d]) -> Vec<WeightedRelation> {
    let mut relations = Vec::new();
    for (i, p) in pairs.iter().enumerate() {
        for (j, q) in pairs.iter().enumerate() {
            if p.outer == q.inner {
                let shared = segments[p.outer].len() as f64;
                relations.extend(WeightedRelation::accept(i, -shared, j));
            }
        }
    }
    relations
}

fn track_from_pair_path(
    path: &[usize],
    pairs: &[SegmentPair],
    segments: &[Segment2d],
    arena: &HitArena,
    layout: &CdcLayout,
    config: &SegmentPairConfig,
) -> Option<Track> {
    let mut segment_indices = vec![pairs[*path.first()?].inner];
    for &pi in path {
        segment_indices.push(pairs[pi].outer);
    }

    // Global axial circle over all axial segments, drift-corrected.
    let mut positions = Vec::new();
    let mut drifts = Vec::new();
    let mut rl_signs = Vec::new();
    let mut sigmas = Vec::new();
    let mut stereo_hits: Vec<(usize, &WireHit)> = Vec::new();
    for &si in &segment_indices {
        let segment = &segments[si];
        if layout.is_axial(segment.superlayer) {
            for (&h, rl) in segment.hits.iter().zip(&segment.rl) {
                positions.push(arena.hits[h].ref_pos);
                drifts.push(arena.hits[h].drift_length);
                rl_signs.push(rl.sign());
                sigmas.push(arena.hits[h].drift_sigma());
            }
        } else {
            stereo_hits.extend(segment.hits.iter().map(|&h| (h, &arena.hits[h])));
        }
    }
    let circle_fit = fit_circle_with_drift(&positions, &drifts, &rl_signs, &sigmas)?;
    let fused = fuse_axial_stereo(&circle_fit, &stereo_hits, layout, config.iterations)?;

    let mut reco_hits = Vec::new();
    for &si in &segment_indices {
        for &h in &segments[si].hits {
            if let Some(reco) =
                reconstruct_on_circle(h, &arena.hits[h], &circle_fit.circle, layout)
            {
                reco_hits.push(reco);
            }
        }
    }
    let mut track = Track {
        reco_hits,
        trajectory: fused,
        axial_only: false,
    };
    track.sort_by_arc_length();
    Some(track)
}

/// Promote a Legendre seed to a track: refit its axial hits, then try to
/// confirm it with unclaimed stereo hits. Without stereo confirmation
/// the track stays axial-only with an uninformative s-z block.
fn track_from_seed(
    seed: &AxialSeed,
    arena: &HitArena,
    layout: &CdcLayout,
    claimed: &[bool],
    pair_config: &SegmentPairConfig,
) -> Option<Track> {
    let hits: Vec<usize> = seed.hits.iter().copied().filter(|&i| !claimed[i]).collect();
    if hits.len() < 3 {
        return None;
    }

    let circle_fit = refit_axial(&hits, &seed.fit, arena)?;
    // A stereo wire can confirm the seed only if its sweep crosses the
    // circle inside the active length; the crossing test is the gate.
    let stereo_hits: Vec<(usize, &WireHit)> = arena
        .hits
        .iter()
        .enumerate()
        .filter(|(i, h)| {
            !claimed[*i]
                && !h.is_axial(layout)
                && !h.cell.has(AutomatonCell::BACKGROUND)
                && !h.cell.has(AutomatonCell::TAKEN)
                && reconstruct_on_circle(*i, h, &circle_fit.circle, layout).is_some()
        })
        .collect();

    let (trajectory, axial_only) =
        match fuse_axial_stereo(&circle_fit, &stereo_hits, layout, pair_config.iterations) {
            Some(fused) => (fused, false),
            None => (axial_only_helix(&circle_fit), true),
        };

    let mut reco_hits = Vec::new();
    for &h in &hits {
        if let Some(reco) = reconstruct_on_circle(h, &arena.hits[h], &circle_fit.circle, layout) {
            reco_hits.push(reco);
        }
    }
    if !axial_only {
        for &(i, hit) in &stereo_hits {
            if let Some(reco) = reconstruct_on_circle(i, hit, &circle_fit.circle, layout) {
                reco_hits.push(reco);
            }
        }
    }
    let mut track = Track {
        reco_hits,
        trajectory,
        axial_only,
    };
    track.sort_by_arc_length();
    Some(track)
}

fn refit_axial(hits: &[usize], seed_fit: &CircleFit, arena: &HitArena) -> Option<CircleFit> {
    let mut ordered = hits.to_vec();
    ordered.sort_by(|&a, &b| {
        seed_fit
            .circle
            .arc_length(arena.hits[a].ref_pos)
            .total_cmp(&seed_fit.circle.arc_length(arena.hits[b].ref_pos))
    });
    let positions: Vec<_> = ordered.iter().map(|&i| arena.hits[i].ref_pos).collect();
    let drifts: Vec<f64> = ordered.iter().map(|&i| arena.hits[i].drift_length).collect();
    // Drift sides are not assigned for seed hits; fit against the band.
    let sigmas: Vec<f64> = ordered
        .iter()
        .map(|&i| {
            let h = &arena.hits[i];
            (h.drift_length * h.drift_length + h.drift_variance).sqrt().max(1e-3)
        })
        .collect();
    fit_circle_with_drift(&positions, &drifts, &[], &sigmas)
}

/// Helix for a track without z information: zero dip, huge s-z variance.
fn axial_only_helix(circle_fit: &CircleFit) -> UncertainHelix {
    let helix = Helix::from_circle_and_sz(circle_fit.circle, 0.0, 0.0);
    let mut covariance = HelixCovariance::zeros();
    covariance
        .fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&circle_fit.covariance);
    covariance[(3, 3)] = 1e6;
    covariance[(4, 4)] = 1e6;
    UncertainHelix {
        helix,
        covariance,
        chi2: circle_fit.chi2,
        ndf: circle_fit.ndf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{find_clusters, ClusteringConfig};
    use crate::eventdata::EventRecord;
    use crate::filters::{FacetFilter, FacetRelationFilter, FilterChoice};
    use crate::hough::{find_axial_seeds, LegendreConfig};
    use crate::segments::{find_segments, FacetConfig, SegmentConfig};
    use crate::sim::{simulate_track, SimConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn one_track_event_builds_one_candidate_with_z() {
        let layout = CdcLayout::default();
        let helix = Helix::new(0.01, 1.2, 0.0, 0.25, 2.0);
        let mut rng = StdRng::seed_from_u64(31);
        let records = simulate_track(&helix, 0, &layout, &SimConfig::noiseless(), &mut rng);
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
        assert!(!segments.is_empty());

        let seeds = find_axial_seeds(&arena, &layout, &LegendreConfig::default());
        let pair_filter = SegmentPairFilter::new(FilterChoice::Simple, 10.0);
        let tracks = build_tracks(
            &segments,
            &seeds,
            &arena,
            &layout,
            &pair_filter,
            None,
            &SegmentPairConfig::default(),
            &CleanupConfig::default(),
        );
        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert!(!track.axial_only);
        assert!(track.len() >= 40);
        assert!((track.trajectory.helix.curvature - 0.01).abs() < 1e-3);
        assert!((track.trajectory.helix.tan_lambda - 0.25).abs() < 0.05);
        assert!((track.trajectory.helix.z0 - 2.0).abs() < 2.0);
    }
}
