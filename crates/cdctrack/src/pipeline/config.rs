//! The full configuration surface and its fail-fast validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clustering::ClusteringConfig;
use crate::filters::FilterChoice;
use crate::hough::LegendreConfig;
use crate::segments::{FacetConfig, FacetRelationConfig, SegmentConfig};
use crate::tracks::{CleanupConfig, SegmentPairConfig, TrackQualityConfig};

/// Complete finder configuration; every field has a documented default,
/// so a partial JSON document configures only what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub quadtree: LegendreConfig,
    pub clustering: ClusteringConfig,
    pub facet: FacetConfig,
    pub facet_relation: FacetRelationConfig,
    pub segment: SegmentConfig,
    pub segment_pair: SegmentPairConfig,
    pub track_quality: TrackQualityConfig,
    pub cleanup: CleanupConfig,
}

/// Configuration problems surface before any event is processed and are
/// never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownFilter { kind: &'static str, name: String },
    InvalidThreshold {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFilter { kind, name } => {
                write!(f, "unknown {kind} filter {name:?} (expected one of none, all, simple, truth, recording)")
            }
            Self::InvalidThreshold {
                name,
                value,
                expected,
            } => write!(f, "invalid value {value} for {name}: expected {expected}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl TrackingConfig {
    /// Resolve a filter name for the given relation kind.
    pub(crate) fn filter_choice(
        kind: &'static str,
        name: &str,
    ) -> Result<FilterChoice, ConfigError> {
        FilterChoice::from_name(name).ok_or_else(|| ConfigError::UnknownFilter {
            kind,
            name: name.to_owned(),
        })
    }

    /// Check threshold consistency.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.quadtree.max_depth == 0 || self.quadtree.max_depth > 24 {
            return Err(ConfigError::InvalidThreshold {
                name: "quadtree.max_depth",
                value: self.quadtree.max_depth as f64,
                expected: "between 1 and 24",
            });
        }
        if self.quadtree.min_leaf_hits < 3 {
            return Err(ConfigError::InvalidThreshold {
                name: "quadtree.min_leaf_hits",
                value: self.quadtree.min_leaf_hits as f64,
                expected: "at least 3 (a circle fit needs three hits)",
            });
        }
        if !(0.0..=1.0).contains(&self.quadtree.max_seed_overlap) {
            return Err(ConfigError::InvalidThreshold {
                name: "quadtree.max_seed_overlap",
                value: self.quadtree.max_seed_overlap,
                expected: "a fraction in [0, 1]",
            });
        }
        if self.quadtree.curv_max <= 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "quadtree.curv_max",
                value: self.quadtree.curv_max,
                expected: "a positive curvature range",
            });
        }
        if !(0.0..=1.0).contains(&self.cleanup.clone_overlap) {
            return Err(ConfigError::InvalidThreshold {
                name: "cleanup.clone_overlap",
                value: self.cleanup.clone_overlap,
                expected: "a fraction in [0, 1]",
            });
        }
        if self.segment.min_hits < 3 {
            return Err(ConfigError::InvalidThreshold {
                name: "segment.min_hits",
                value: self.segment.min_hits as f64,
                expected: "at least 3 (one facet)",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(TrackingConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_depth_is_rejected_with_a_descriptive_message() {
        let mut config = TrackingConfig::default();
        config.quadtree.max_depth = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quadtree.max_depth"));
    }

    #[test]
    fn partial_json_keeps_defaults_elsewhere() {
        let config: TrackingConfig =
            serde_json::from_str(r#"{"quadtree": {"min_leaf_hits": 4}}"#).unwrap();
        assert_eq!(config.quadtree.min_leaf_hits, 4);
        assert_eq!(config.segment.min_hits, SegmentConfig::default().min_hits);
    }
}
