//! Tracks: multi-super-layer hit chains with one fitted 3D helix.

use crate::eventdata::RecoHit3d;
use crate::geometry::UncertainHelix;

/// A track candidate under construction or finalized.
///
/// Until [`crate::tracks::cleanup`] has run, different tracks may still
/// claim the same hit; the cleanup pass establishes exclusive ownership.
#[derive(Debug, Clone)]
pub struct Track {
    /// Reconstructed hits ordered by 2D arc length.
    pub reco_hits: Vec<RecoHit3d>,
    pub trajectory: UncertainHelix,
    /// True when the track was built from axial information only
    /// (Legendre seed without stereo confirmation).
    pub axial_only: bool,
}

impl Track {
    pub fn len(&self) -> usize {
        self.reco_hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reco_hits.is_empty()
    }

    pub fn hit_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.reco_hits.iter().map(|rh| rh.hit)
    }

    /// Sort hits along the flight direction.
    pub fn sort_by_arc_length(&mut self) {
        self.reco_hits
            .sort_by(|a, b| a.arc_length.total_cmp(&b.arc_length));
    }
}
