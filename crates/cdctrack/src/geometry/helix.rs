//! 3D helix parameters and the uncertain variant carrying a covariance.

use nalgebra::{SMatrix, Vector2};
use serde::{Deserialize, Serialize};

use super::PerigeeCircle;

/// Covariance matrix over the five helix parameters in the order
/// (curvature, phi0, impact, tan_lambda, z0).
pub type HelixCovariance = SMatrix<f64, 5, 5>;

/// A 3D helix: a perigee circle in the transverse plane plus a linear
/// z-motion along the 2D arc length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Helix {
    pub curvature: f64,
    pub phi0: f64,
    pub impact: f64,
    /// Slope dz/ds of the z motion versus transverse arc length.
    pub tan_lambda: f64,
    /// z position at the transverse perigee.
    pub z0: f64,
}

impl Helix {
    pub fn new(curvature: f64, phi0: f64, impact: f64, tan_lambda: f64, z0: f64) -> Self {
        Self {
            curvature,
            phi0,
            impact,
            tan_lambda,
            z0,
        }
    }

    /// The transverse projection.
    pub fn circle(&self) -> PerigeeCircle {
        PerigeeCircle::new(self.curvature, self.phi0, self.impact)
    }

    /// Build a helix from a transverse circle and an s-z line.
    pub fn from_circle_and_sz(circle: PerigeeCircle, tan_lambda: f64, z0: f64) -> Self {
        Self {
            curvature: circle.curvature,
            phi0: circle.phi0,
            impact: circle.impact,
            tan_lambda,
            z0,
        }
    }

    /// z position at transverse arc length `s` from the perigee.
    pub fn z_at_arc_length(&self, s: f64) -> f64 {
        self.z0 + self.tan_lambda * s
    }

    /// Expected z at the closest transverse approach of `p`.
    pub fn z_at_point(&self, p: Vector2<f64>) -> f64 {
        self.z_at_arc_length(self.circle().arc_length(p))
    }

    pub fn is_finite(&self) -> bool {
        self.curvature.is_finite()
            && self.phi0.is_finite()
            && self.impact.is_finite()
            && self.tan_lambda.is_finite()
            && self.z0.is_finite()
    }
}

/// A helix together with its parameter covariance and fit quality.
#[derive(Debug, Clone)]
pub struct UncertainHelix {
    pub helix: Helix,
    pub covariance: HelixCovariance,
    pub chi2: f64,
    pub ndf: usize,
}

impl UncertainHelix {
    pub fn chi2_per_ndf(&self) -> f64 {
        if self.ndf == 0 {
            f64::NAN
        } else {
            self.chi2 / self.ndf as f64
        }
    }
}
