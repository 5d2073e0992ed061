//! Track cleanup: quality gate, clone removal, hit-ownership
//! reconciliation, and unused-hit pickup.
//!
//! The pass is idempotent: once every hit has a unique owner and the
//! taken flags are set, a second run finds nothing to contest and no
//! unclaimed hits to pick up, so the assignment is unchanged.

use std::collections::HashMap;

use nalgebra::Vector2;

use crate::ca::AutomatonCell;
use crate::eventdata::{HitArena, RecoHit3d, Track};
use crate::filters::{McTruth, TrackQualityFilter};
use crate::fitting::reconstruct_on_circle;
use crate::topology::CdcLayout;

use super::CleanupConfig;

/// Reconcile the candidate set into the final tracks.
///
/// Marks every surviving hit [`AutomatonCell::TAKEN`].
pub fn cleanup_tracks(
    candidates: Vec<Track>,
    arena: &mut HitArena,
    layout: &CdcLayout,
    quality_filter: &TrackQualityFilter,
    truth: Option<&McTruth>,
    config: &CleanupConfig,
) -> Vec<Track> {
    // Quality gate and ordering: better tracks first, so they win ties.
    let mut scored: Vec<(f64, Track)> = candidates
        .into_iter()
        .filter_map(|t| {
            let score = quality_filter.score(&t, arena, truth);
            score.is_finite().then_some((score, t))
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    // Clone removal: a candidate overlapping a better one too much is a
    // duplicate of the same particle and is dropped whole.
    let mut tracks: Vec<Track> = Vec::new();
    for (_, candidate) in scored {
        let duplicate = tracks.iter().any(|kept| {
            let shared = candidate
                .hit_indices()
                .filter(|i| kept.hit_indices().any(|j| j == *i))
                .count();
            let denom = candidate.len().min(kept.len()).max(1);
            shared as f64 / denom as f64 > config.clone_overlap
        });
        if !duplicate {
            tracks.push(candidate);
        }
    }

    resolve_contested_hits(&mut tracks, arena, layout);

    // Dropping contested hits may have gutted a track below usefulness.
    tracks.retain(|t| quality_filter.score(t, arena, truth).is_finite());

    pick_up_unused_hits(&mut tracks, arena, layout, config);

    for track in &mut tracks {
        track.sort_by_arc_length();
        for i in track.hit_indices().collect::<Vec<_>>() {
            arena.hits[i].cell.set(AutomatonCell::TAKEN);
        }
    }
    tracing::info!(n_tracks = tracks.len(), "track cleanup finished");
    tracks
}

/// Assign each contested hit to the track whose trajectory passes
/// closer to its drift circle; remove it from the others.
fn resolve_contested_hits(tracks: &mut [Track], arena: &HitArena, layout: &CdcLayout) {
    let mut owners: HashMap<usize, Vec<usize>> = HashMap::new();
    for (ti, track) in tracks.iter().enumerate() {
        for hit in track.hit_indices() {
            owners.entry(hit).or_default().push(ti);
        }
    }

    for (hit, contenders) in owners {
        if contenders.len() < 2 {
            continue;
        }
        let winner = contenders
            .iter()
            .copied()
            .min_by(|&a, &b| {
                drift_residual(&tracks[a], hit, arena, layout)
                    .total_cmp(&drift_residual(&tracks[b], hit, arena, layout))
            })
            .unwrap_or(contenders[0]);
        for &ti in &contenders {
            if ti != winner {
                tracks[ti].reco_hits.retain(|r| r.hit != hit);
            }
        }
    }
}

/// Distance between the track's circle and the hit's drift circle.
///
/// The circle is evaluated at the wire position, swept to the track's
/// reconstructed z for stereo wires; the reconstructed hit position
/// itself lies on the circle by construction and carries no
/// discriminating information.
fn drift_residual(track: &Track, hit: usize, arena: &HitArena, layout: &CdcLayout) -> f64 {
    let circle = track.trajectory.helix.circle();
    let h = &arena.hits[hit];
    let slope = layout.stereo_slope(h.wire);
    let wire_pos = match track.reco_hits.iter().find(|r| r.hit == hit) {
        Some(r) if slope != 0.0 && r.z.is_finite() => {
            let phi = layout.wire_phi(h.wire);
            h.ref_pos + Vector2::new(-phi.sin(), phi.cos()) * (slope * r.z)
        }
        _ => h.ref_pos,
    };
    (circle.distance(wire_pos).abs() - h.drift_length).abs()
}

/// Append unclaimed hits lying on a surviving trajectory. Axial hits are
/// gated by the transverse drift residual, stereo hits by the crossing
/// existence plus the z prediction of the fused helix.
fn pick_up_unused_hits(
    tracks: &mut [Track],
    arena: &HitArena,
    layout: &CdcLayout,
    config: &CleanupConfig,
) {
    let mut claimed = vec![false; arena.len()];
    for track in tracks.iter() {
        for hit in track.hit_indices() {
            claimed[hit] = true;
        }
    }

    for track in tracks.iter_mut() {
        let circle = track.trajectory.helix.circle();
        let mut appended: Vec<RecoHit3d> = Vec::new();
        for (i, hit) in arena.hits.iter().enumerate() {
            if claimed[i]
                || hit.cell.has(AutomatonCell::BACKGROUND)
                || hit.cell.has(AutomatonCell::TAKEN)
            {
                continue;
            }
            let Some(reco) = reconstruct_on_circle(i, hit, &circle, layout) else {
                continue;
            };
            let accepted = if hit.is_axial(layout) {
                let residual =
                    (circle.distance(hit.ref_pos).abs() - hit.drift_length).abs();
                residual <= config.pickup_distance
            } else {
                if track.axial_only {
                    // No dip estimate to check the crossing against.
                    false
                } else {
                    let z_expected = track.trajectory.helix.z_at_arc_length(reco.arc_length);
                    (reco.z - z_expected).abs() <= config.pickup_z_window
                }
            };
            if accepted {
                claimed[i] = true;
                appended.push(reco);
            }
        }
        track.reco_hits.extend(appended);
    }
}
