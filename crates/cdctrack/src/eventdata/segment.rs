//! Segments: chains of wire hits within one super-layer.

use nalgebra::Vector2;

use crate::eventdata::RlInfo;
use crate::fitting::CircleFit;

/// A 2D segment: hits of one super-layer chained by the facet automaton,
/// with a fitted transverse trajectory.
#[derive(Debug, Clone)]
pub struct Segment2d {
    /// Hit arena indices, ordered along the trajectory.
    pub hits: Vec<usize>,
    /// Drift side per hit, parallel to `hits`.
    pub rl: Vec<RlInfo>,
    pub superlayer: u8,
    /// Transverse circle fit of the segment.
    pub fit: CircleFit,
}

impl Segment2d {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// A wire hit displaced onto a reference trajectory: 2D position after
/// drift correction, reconstructed z (NaN for axial hits without z
/// information), and the 2D arc length along the trajectory.
#[derive(Debug, Clone, Copy)]
pub struct RecoHit3d {
    pub hit: usize,
    pub pos: Vector2<f64>,
    pub z: f64,
    pub arc_length: f64,
}
