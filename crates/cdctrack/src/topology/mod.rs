//! Wire identities, super-layer layout, and the wire neighborhood relation.
//!
//! The layout acts as the read-only geometry service of the finder: every
//! pipeline stage receives a `&CdcLayout` and looks up wire positions, skew
//! geometry, and neighborhoods through it. Nothing in here is mutated per
//! event.

mod layout;

pub use layout::{CdcLayout, LayoutSpec, SuperLayerKind, SuperLayerSpec};

use serde::{Deserialize, Serialize};

/// Identity of a single sense wire: super-layer, layer within the
/// super-layer, and wire index around the circumference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireId {
    /// Super-layer index, innermost is 0.
    pub superlayer: u8,
    /// Layer index within the super-layer.
    pub layer: u8,
    /// Wire index within the layer, counted counterclockwise.
    pub wire: u16,
}

impl WireId {
    pub fn new(superlayer: u8, layer: u8, wire: u16) -> Self {
        Self {
            superlayer,
            layer,
            wire,
        }
    }
}

/// Shortest circular distance between two wire indices on layers with
/// `n_wires` cells.
pub fn circular_wire_distance(a: u16, b: u16, n_wires: u16) -> u16 {
    let d = if a > b { a - b } else { b - a };
    d.min(n_wires - d)
}
