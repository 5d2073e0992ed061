//! The pluggable relation-scoring framework.
//!
//! Every candidate entity or relation passes through a filter that maps
//! it to an acceptance weight; NaN is the universal rejection sentinel
//! and never enters a relation store (see
//! [`crate::ca::WeightedRelation::accept`]). Filters are selected by
//! name at setup time and hold no hidden state beyond the per-event
//! recording buffer of the `recording` variant; for fixed inputs a
//! filter returns the same weight every time.

mod facet;
mod pair;
mod quality;
mod recording;
mod truth;

pub use facet::{FacetFilter, FacetRelationFilter};
pub use pair::SegmentPairFilter;
pub use quality::TrackQualityFilter;
pub use recording::Recorder;
pub use truth::McTruth;

/// Scoring strategy, selected by configured name at pipeline setup.
///
/// Callers never branch on the active variant; they only see the weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterChoice {
    /// Reject everything.
    None,
    /// Accept everything at the nominal weight.
    All,
    /// Geometric criteria with configured cuts (the production choice).
    Simple,
    /// Accept only relations pure in Monte-Carlo truth; needs a truth
    /// table and exists for validation runs.
    Truth,
    /// Score like `Simple` while collecting labeled variable rows for
    /// classifier training.
    Recording,
}

impl FilterChoice {
    /// Parse a configured filter name. Unknown names return `None`; the
    /// pipeline setup turns that into a configuration error before any
    /// event is processed.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "all" => Some(Self::All),
            "simple" => Some(Self::Simple),
            "truth" => Some(Self::Truth),
            "recording" => Some(Self::Recording),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::All => "all",
            Self::Simple => "simple",
            Self::Truth => "truth",
            Self::Recording => "recording",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_round_trip() {
        for name in ["none", "all", "simple", "truth", "recording"] {
            assert_eq!(FilterChoice::from_name(name).unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(FilterChoice::from_name("tmva").is_none());
        assert!(FilterChoice::from_name("").is_none());
    }
}
