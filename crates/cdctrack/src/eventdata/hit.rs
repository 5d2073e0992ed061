//! The per-event wire-hit arena.

use nalgebra::Vector2;

use crate::ca::AutomatonCell;
use crate::eventdata::EventRecord;
use crate::topology::{CdcLayout, WireId};

/// One prepared wire hit: the immutable sensor reading resolved against
/// the geometry, plus the mutable automaton cell.
///
/// Hits are referenced by their arena index everywhere downstream; the
/// reading itself is never copied or modified after preparation.
#[derive(Debug, Clone)]
pub struct WireHit {
    pub wire: WireId,
    /// Continuous layer index, cached from the layout.
    pub clayer: u16,
    /// Wire reference position at z = 0 (cm).
    pub ref_pos: Vector2<f64>,
    /// Drift length estimate (cm), clamped to non-negative.
    pub drift_length: f64,
    /// Drift length variance (cm^2).
    pub drift_variance: f64,
    /// Monte-Carlo particle index when simulated, for truth filters only.
    pub mc_particle: Option<u32>,
    /// Mutable automaton state (taken/background/masked flags, usage).
    pub cell: AutomatonCell,
}

impl WireHit {
    pub fn is_axial(&self, layout: &CdcLayout) -> bool {
        layout.is_axial(self.wire.superlayer)
    }

    pub fn drift_sigma(&self) -> f64 {
        self.drift_variance.max(1e-12).sqrt()
    }
}

/// Owns all wire hits of one event.
#[derive(Debug, Default)]
pub struct HitArena {
    pub hits: Vec<WireHit>,
}

impl HitArena {
    /// Resolve raw hit records against the layout.
    ///
    /// Records referring to non-existent wires are dropped with a warning;
    /// they indicate an upstream unpacking problem, not a reason to abort
    /// the event. Nonsensical drift lengths (negative, non-finite, or far
    /// beyond the cell) are clamped into the physical range.
    pub fn prepare(event: &EventRecord, layout: &CdcLayout) -> Self {
        let mut hits = Vec::with_capacity(event.hits.len());
        let mut n_dropped = 0usize;
        for record in &event.hits {
            if !layout.contains(record.wire) {
                n_dropped += 1;
                continue;
            }
            let cell_width = layout.cell_half_width(record.wire);
            let drift_length = if record.drift_length.is_finite() {
                record.drift_length.clamp(0.0, cell_width)
            } else {
                0.0
            };
            let drift_variance = if record.drift_variance.is_finite() && record.drift_variance > 0.0
            {
                record.drift_variance
            } else {
                // Fall back to a coarse cell-resolution guess.
                (cell_width * 0.3).powi(2)
            };
            hits.push(WireHit {
                wire: record.wire,
                clayer: layout.continuous_layer(record.wire),
                ref_pos: layout.wire_ref_pos(record.wire),
                drift_length,
                drift_variance,
                mc_particle: record.mc_particle,
                cell: AutomatonCell::with_weight(1.0),
            });
        }
        if n_dropped > 0 {
            tracing::warn!(n_dropped, "dropped hit records on non-existent wires");
        }
        // Stable processing order: by continuous layer, then by wire.
        hits.sort_by_key(|h| (h.clayer, h.wire.wire));
        Self { hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Indices of hits in axial super-layers that are neither taken nor
    /// flagged as background.
    pub fn usable_axial_hits(&self, layout: &CdcLayout) -> Vec<usize> {
        self.hits
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                h.is_axial(layout)
                    && !h.cell.has(AutomatonCell::TAKEN)
                    && !h.cell.has(AutomatonCell::BACKGROUND)
            })
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventdata::HitRecord;

    fn record(superlayer: u8, layer: u8, wire: u16) -> HitRecord {
        HitRecord {
            wire: WireId::new(superlayer, layer, wire),
            drift_length: 0.1,
            drift_variance: 0.0004,
            mc_particle: None,
        }
    }

    #[test]
    fn prepare_drops_invalid_wires_and_sorts_by_layer() {
        let layout = CdcLayout::default();
        let event = EventRecord {
            hits: vec![record(3, 1, 5), record(0, 0, 0), record(200, 0, 0)],
        };
        let arena = HitArena::prepare(&event, &layout);
        assert_eq!(arena.len(), 2);
        assert!(arena.hits[0].clayer < arena.hits[1].clayer);
    }

    #[test]
    fn prepare_clamps_unphysical_drift_lengths() {
        let layout = CdcLayout::default();
        let mut bad = record(0, 0, 0);
        bad.drift_length = -5.0;
        bad.drift_variance = f64::NAN;
        let arena = HitArena::prepare(&EventRecord { hits: vec![bad] }, &layout);
        assert_eq!(arena.hits[0].drift_length, 0.0);
        assert!(arena.hits[0].drift_variance > 0.0);
    }
}
