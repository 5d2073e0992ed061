//! Serializable event input records.

use serde::{Deserialize, Serialize};

use crate::topology::WireId;

/// One digitized wire hit as delivered by the external framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitRecord {
    pub wire: WireId,
    /// Calibrated drift length estimate (cm).
    pub drift_length: f64,
    /// Variance of the drift length estimate (cm^2).
    pub drift_variance: f64,
    /// Monte-Carlo particle index, present only in simulated events.
    /// Consumed exclusively by the truth filter variants.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mc_particle: Option<u32>,
}

/// The full hit content of one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRecord {
    pub hits: Vec<HitRecord>,
}
