//! Concrete chamber layout: super-layer geometry and wire position lookup.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::WireId;

/// Orientation of the wires in a super-layer.
///
/// Axial wires run parallel to the chamber axis. Stereo wires are strung
/// with a small skew so that the hit position along the wire carries z
/// information; U and V layers are skewed in opposite directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuperLayerKind {
    Axial,
    StereoU,
    StereoV,
}

impl SuperLayerKind {
    pub fn is_axial(self) -> bool {
        matches!(self, Self::Axial)
    }

    /// Sign of the stereo skew: +1 for U, -1 for V, 0 for axial.
    pub fn stereo_sign(self) -> f64 {
        match self {
            Self::Axial => 0.0,
            Self::StereoU => 1.0,
            Self::StereoV => -1.0,
        }
    }
}

/// Geometry of one super-layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperLayerSpec {
    /// Wire orientation of this super-layer.
    pub kind: SuperLayerKind,
    /// Number of wire layers.
    pub n_layers: u8,
    /// Radius of the innermost layer (cm).
    pub inner_radius: f64,
    /// Radial spacing between consecutive layers (cm).
    pub layer_spacing: f64,
    /// Number of wires per layer.
    pub n_wires: u16,
    /// Magnitude of the stereo skew angle (rad); ignored for axial layers.
    pub stereo_angle: f64,
    /// Half of the active wire length along z (cm).
    pub half_length: f64,
}

/// Serializable description of a full chamber layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub superlayers: Vec<SuperLayerSpec>,
}

impl Default for LayoutSpec {
    /// Eight alternating axial/stereo super-layers of six layers each,
    /// spanning radii from 17 cm to about 105 cm.
    fn default() -> Self {
        let mut superlayers = Vec::with_capacity(8);
        for isl in 0..8u8 {
            let kind = match isl % 4 {
                0 | 2 => SuperLayerKind::Axial,
                1 => SuperLayerKind::StereoU,
                _ => SuperLayerKind::StereoV,
            };
            superlayers.push(SuperLayerSpec {
                kind,
                n_layers: 6,
                inner_radius: 17.0 + 11.0 * isl as f64,
                layer_spacing: 1.5,
                n_wires: 160 + 32 * isl as u16,
                stereo_angle: 0.07,
                half_length: 110.0,
            });
        }
        Self { superlayers }
    }
}

/// The wire lattice with position lookup, built once from a [`LayoutSpec`].
///
/// Passed by shared reference into every component that needs geometry.
#[derive(Debug, Clone)]
pub struct CdcLayout {
    superlayers: Vec<SuperLayerSpec>,
    /// First continuous layer index of each super-layer.
    clayer_offsets: Vec<u16>,
    n_layers_total: u16,
}

impl CdcLayout {
    pub fn new(spec: LayoutSpec) -> Self {
        let mut clayer_offsets = Vec::with_capacity(spec.superlayers.len());
        let mut offset = 0u16;
        for sl in &spec.superlayers {
            clayer_offsets.push(offset);
            offset += sl.n_layers as u16;
        }
        Self {
            superlayers: spec.superlayers,
            clayer_offsets,
            n_layers_total: offset,
        }
    }

    pub fn n_superlayers(&self) -> usize {
        self.superlayers.len()
    }

    pub fn n_layers_total(&self) -> u16 {
        self.n_layers_total
    }

    pub fn superlayer(&self, isl: u8) -> &SuperLayerSpec {
        &self.superlayers[isl as usize]
    }

    pub fn is_axial(&self, isl: u8) -> bool {
        self.superlayers[isl as usize].kind.is_axial()
    }

    /// Whether the wire identity refers to an existing wire.
    pub fn contains(&self, wire: WireId) -> bool {
        let Some(sl) = self.superlayers.get(wire.superlayer as usize) else {
            return false;
        };
        wire.layer < sl.n_layers && wire.wire < sl.n_wires
    }

    /// Continuous layer index counted from the innermost layer of the
    /// chamber, used for ordering hits across super-layers.
    pub fn continuous_layer(&self, wire: WireId) -> u16 {
        self.clayer_offsets[wire.superlayer as usize] + wire.layer as u16
    }

    /// Cylindrical radius of the wire's layer (cm).
    pub fn layer_radius(&self, wire: WireId) -> f64 {
        let sl = self.superlayer(wire.superlayer);
        sl.inner_radius + sl.layer_spacing * wire.layer as f64
    }

    /// Azimuth of the wire at z = 0. Odd layers are staggered by half a
    /// cell.
    pub fn wire_phi(&self, wire: WireId) -> f64 {
        let sl = self.superlayer(wire.superlayer);
        let stagger = 0.5 * (wire.layer % 2) as f64;
        std::f64::consts::TAU * (wire.wire as f64 + stagger) / sl.n_wires as f64
    }

    /// Reference position of the wire in the transverse plane at z = 0 (cm).
    pub fn wire_ref_pos(&self, wire: WireId) -> Vector2<f64> {
        let r = self.layer_radius(wire);
        let phi = self.wire_phi(wire);
        Vector2::new(r * phi.cos(), r * phi.sin())
    }

    /// Tangential displacement of the wire per unit z (cm/cm).
    ///
    /// Zero for axial wires. For stereo wires the wire sweeps in the
    /// direction perpendicular to its radius as z varies.
    pub fn stereo_slope(&self, wire: WireId) -> f64 {
        let sl = self.superlayer(wire.superlayer);
        sl.kind.stereo_sign() * sl.stereo_angle.tan()
    }

    /// Transverse position of the wire at height z (cm).
    pub fn wire_pos_at_z(&self, wire: WireId, z: f64) -> Vector2<f64> {
        let ref_pos = self.wire_ref_pos(wire);
        let slope = self.stereo_slope(wire);
        if slope == 0.0 {
            return ref_pos;
        }
        let phi = self.wire_phi(wire);
        // Unit vector perpendicular to the wire radius, pointing
        // counterclockwise.
        let tangent = Vector2::new(-phi.sin(), phi.cos());
        ref_pos + tangent * (slope * z)
    }

    pub fn half_length(&self, wire: WireId) -> f64 {
        self.superlayer(wire.superlayer).half_length
    }

    /// Nominal half-width of a drift cell in this layer (cm), used as the
    /// maximum sensible drift length.
    pub fn cell_half_width(&self, wire: WireId) -> f64 {
        let sl = self.superlayer(wire.superlayer);
        let r = self.layer_radius(wire);
        std::f64::consts::PI * r / sl.n_wires as f64
    }

    /// Wire in the given layer closest in azimuth to `phi`.
    pub fn closest_wire(&self, isl: u8, layer: u8, phi: f64) -> WireId {
        let sl = self.superlayer(isl);
        let stagger = 0.5 * (layer % 2) as f64;
        let raw = phi.rem_euclid(std::f64::consts::TAU) / std::f64::consts::TAU
            * sl.n_wires as f64
            - stagger;
        let idx = raw.round().rem_euclid(sl.n_wires as f64) as u16 % sl.n_wires;
        WireId::new(isl, layer, idx)
    }
}

impl Default for CdcLayout {
    fn default() -> Self {
        Self::new(LayoutSpec::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_layers_cover_all_superlayers() {
        let layout = CdcLayout::default();
        assert_eq!(layout.n_superlayers(), 8);
        assert_eq!(layout.n_layers_total(), 48);
        assert_eq!(layout.continuous_layer(WireId::new(0, 0, 0)), 0);
        assert_eq!(layout.continuous_layer(WireId::new(1, 0, 0)), 6);
        assert_eq!(layout.continuous_layer(WireId::new(7, 5, 0)), 47);
    }

    #[test]
    fn axial_wires_do_not_move_with_z() {
        let layout = CdcLayout::default();
        let wire = WireId::new(0, 2, 17);
        assert!(layout.is_axial(0));
        let at_zero = layout.wire_pos_at_z(wire, 0.0);
        let at_top = layout.wire_pos_at_z(wire, 80.0);
        assert_eq!(at_zero, at_top);
    }

    #[test]
    fn stereo_wires_sweep_tangentially() {
        let layout = CdcLayout::default();
        let wire = WireId::new(1, 0, 0);
        assert!(!layout.is_axial(1));
        let lo = layout.wire_pos_at_z(wire, -50.0);
        let hi = layout.wire_pos_at_z(wire, 50.0);
        assert!((lo - hi).norm() > 1.0);
        // The sweep preserves the distance to the radial direction only to
        // first order, but the ref position must be the midpoint.
        let mid = layout.wire_ref_pos(wire);
        assert!(((lo + hi) * 0.5 - mid).norm() < 1e-9);
    }

    #[test]
    fn closest_wire_round_trips_wire_phi() {
        let layout = CdcLayout::default();
        for &w in &[0u16, 1, 79, 159] {
            let wire = WireId::new(0, 1, w);
            let phi = layout.wire_phi(wire);
            assert_eq!(layout.closest_wire(0, 1, phi), wire);
        }
    }
}
