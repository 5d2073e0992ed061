//! Track-level quality scoring used by the cleanup stage.

use crate::eventdata::{HitArena, Track};

use super::{FilterChoice, McTruth, Recorder};

/// Scores a fused track; higher is better, NaN drops the track.
///
/// The cleanup stage sorts surviving tracks by this score before
/// resolving hit contention, so the better track keeps contested hits
/// when trajectory distances tie.
#[derive(Debug)]
pub struct TrackQualityFilter {
    choice: FilterChoice,
    /// Tracks with fewer hits than this are dropped.
    min_hits: usize,
    /// Upper cut on the helix chi-square per degree of freedom.
    max_chi2_ndf: f64,
    recorder: Recorder,
}

impl TrackQualityFilter {
    pub fn new(choice: FilterChoice, min_hits: usize, max_chi2_ndf: f64) -> Self {
        Self {
            choice,
            min_hits,
            max_chi2_ndf,
            recorder: Recorder::new(vec!["n_hits", "chi2_ndf", "truth"]),
        }
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn score(&self, track: &Track, _arena: &HitArena, truth: Option<&McTruth>) -> f64 {
        match self.choice {
            FilterChoice::None => f64::NAN,
            FilterChoice::All => track.len() as f64,
            FilterChoice::Simple => self.simple(track),
            FilterChoice::Truth => match truth {
                Some(t) if t.all_same_particle(track.hit_indices()) => track.len() as f64,
                _ => f64::NAN,
            },
            FilterChoice::Recording => {
                let label = truth
                    .map(|t| t.all_same_particle(track.hit_indices()) as u8 as f64)
                    .unwrap_or(f64::NAN);
                self.recorder.record(vec![
                    track.len() as f64,
                    track.trajectory.chi2_per_ndf(),
                    label,
                ]);
                self.simple(track)
            }
        }
    }

    fn simple(&self, track: &Track) -> f64 {
        if track.len() < self.min_hits {
            return f64::NAN;
        }
        let chi2_ndf = track.trajectory.chi2_per_ndf();
        if !chi2_ndf.is_finite() || chi2_ndf > self.max_chi2_ndf {
            return f64::NAN;
        }
        // Length dominates; the fit quality breaks ties between clones.
        track.len() as f64 - 0.1 * chi2_ndf
    }
}
