//! Filter over axial-stereo segment pairs.

use crate::eventdata::HitArena;
use crate::geometry::UncertainHelix;

use super::{FilterChoice, McTruth, Recorder};

/// Scores a candidate segment pair from its fusion result; the weight
/// becomes the pair's cell weight in the pair automaton.
#[derive(Debug)]
pub struct SegmentPairFilter {
    choice: FilterChoice,
    /// Upper cut on the fused chi-square per degree of freedom.
    max_chi2_ndf: f64,
    recorder: Recorder,
}

impl SegmentPairFilter {
    pub fn new(choice: FilterChoice, max_chi2_ndf: f64) -> Self {
        Self {
            choice,
            max_chi2_ndf,
            recorder: Recorder::new(vec!["chi2_ndf", "n_hits", "truth"]),
        }
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// `fused` is the axial-stereo fusion result (`None` when fusion
    /// failed); `hits` are the distinct hits of both segments. Accepted
    /// pairs weigh their hit count so the pair automaton state counts
    /// hits along a chain.
    pub fn score(
        &self,
        fused: Option<&UncertainHelix>,
        hits: &[usize],
        _arena: &HitArena,
        truth: Option<&McTruth>,
    ) -> f64 {
        match self.choice {
            FilterChoice::None => f64::NAN,
            FilterChoice::All => hits.len() as f64,
            FilterChoice::Simple => self.simple(fused, hits),
            FilterChoice::Truth => match truth {
                Some(t) if t.all_same_particle(hits.iter().copied()) => hits.len() as f64,
                _ => f64::NAN,
            },
            FilterChoice::Recording => {
                let chi2_ndf = fused.map(UncertainHelix::chi2_per_ndf).unwrap_or(f64::NAN);
                let label = truth
                    .map(|t| t.all_same_particle(hits.iter().copied()) as u8 as f64)
                    .unwrap_or(f64::NAN);
                self.recorder
                    .record(vec![chi2_ndf, hits.len() as f64, label]);
                self.simple(fused, hits)
            }
        }
    }

    fn simple(&self, fused: Option<&UncertainHelix>, hits: &[usize]) -> f64 {
        match fused {
            Some(helix) if helix.chi2_per_ndf() <= self.max_chi2_ndf => hits.len() as f64,
            _ => f64::NAN,
        }
    }
}
