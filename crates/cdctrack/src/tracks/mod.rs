//! Track-level stages: segment-pair chaining, candidate building, and
//! the cleanup pass that establishes exclusive hit ownership.

mod builder;
mod cleanup;

pub use builder::{build_tracks, SegmentPair};
pub use cleanup::cleanup_tracks;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentPairConfig {
    /// Filter variant for segment-pair acceptance.
    pub filter: String,
    /// Upper cut on the fused chi-square per degree of freedom.
    pub max_chi2_ndf: f64,
    /// Fusion refinement iterations; passes beyond the first resolve the
    /// drift side along the stereo wires against the previous s-z line.
    pub iterations: usize,
}

impl Default for SegmentPairConfig {
    fn default() -> Self {
        Self {
            filter: "simple".into(),
            max_chi2_ndf: 10.0,
            iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackQualityConfig {
    /// Filter variant for the track quality score.
    pub filter: String,
    /// Tracks with fewer hits are dropped.
    pub min_hits: usize,
    /// Upper cut on the helix chi-square per degree of freedom.
    pub max_chi2_ndf: f64,
}

impl Default for TrackQualityConfig {
    fn default() -> Self {
        Self {
            filter: "simple".into(),
            min_hits: 5,
            max_chi2_ndf: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Hit-overlap fraction above which the worse candidate is a clone.
    pub clone_overlap: f64,
    /// Transverse drift residual below which an unclaimed axial hit is
    /// appended to a passing track (cm).
    pub pickup_distance: f64,
    /// z window around the helix prediction for stereo pickup (cm).
    pub pickup_z_window: f64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            clone_overlap: 0.6,
            pickup_distance: 0.2,
            pickup_z_window: 15.0,
        }
    }
}
