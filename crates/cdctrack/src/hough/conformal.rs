//! Conformal mapping of wire hits into the Legendre parameter space.

use nalgebra::Vector2;

/// Conformal image of one axial wire hit.
///
/// The map `q = 2 p / |p|^2` sends circles through the origin to straight
/// lines: a trajectory with signed curvature `kappa` and center azimuth
/// `theta` satisfies `q . n(theta) = kappa` for every hit position `p` on
/// it. The drift length maps to a band half-width `2 d / |p|^2` around
/// that line.
#[derive(Debug, Clone, Copy)]
pub struct ConformalHit {
    pub q: Vector2<f64>,
    /// Conformal drift band half-width.
    pub band: f64,
}

impl ConformalHit {
    pub fn new(position: Vector2<f64>, drift_length: f64) -> Self {
        let norm2 = position.norm_squared().max(1e-12);
        Self {
            q: position * (2.0 / norm2),
            band: 2.0 * drift_length / norm2,
        }
    }

    /// Signed distance of the drift-shifted sinogram to curvature `kappa`
    /// at angle `theta`; `side` selects the drift sign (+1 or -1).
    pub fn sinogram_distance(&self, theta: f64, kappa: f64, side: f64) -> f64 {
        self.q.x * theta.cos() + self.q.y * theta.sin() + side * self.band - kappa
    }

    /// Angle at which the sinogram is extremal, wrapped into [0, tau).
    pub fn extremum_angle(&self) -> f64 {
        self.q.y.atan2(self.q.x).rem_euclid(std::f64::consts::TAU)
    }
}
