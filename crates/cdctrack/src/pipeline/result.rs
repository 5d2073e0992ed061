//! Serializable export of finalized tracks.

use serde::{Deserialize, Serialize};

use crate::eventdata::{HitArena, Track};
use crate::geometry::Helix;
use crate::topology::WireId;

/// One finalized track in export form: the ordered hit list and the
/// fitted helix, ready for a downstream fitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Arena indices of the owned hits, ordered along the trajectory;
    /// exclusive across the tracks of one result.
    pub hits: Vec<usize>,
    /// Wires of the owned hits, parallel to `hits`.
    pub wires: Vec<WireId>,
    pub helix: Helix,
    pub chi2: f64,
    pub ndf: usize,
    /// Built without stereo confirmation; the z parameters are nominal.
    pub axial_only: bool,
}

impl TrackRecord {
    pub fn from_track(track: &Track, arena: &HitArena) -> Self {
        Self {
            hits: track.hit_indices().collect(),
            wires: track
                .hit_indices()
                .map(|i| arena.hits[i].wire)
                .collect(),
            helix: track.trajectory.helix,
            chi2: track.trajectory.chi2,
            ndf: track.trajectory.ndf,
            axial_only: track.axial_only,
        }
    }

    pub fn n_hits(&self) -> usize {
        self.wires.len()
    }
}

/// Per-event outcome with stage counters for bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingResult {
    pub tracks: Vec<TrackRecord>,
    pub n_hits: usize,
    pub n_clusters: usize,
    pub n_segments: usize,
    pub n_seeds: usize,
}
