//! Perigee parametrization of a 2D circular trajectory.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::CURVATURE_EPS;

/// A circular trajectory in the transverse plane in perigee coordinates.
///
/// * `curvature` — signed inverse radius; positive curvature bends
///   counterclockwise. Magnitudes below [`CURVATURE_EPS`] are treated as a
///   straight line.
/// * `phi0` — azimuth of the flight direction at the point of closest
///   approach to the origin.
/// * `impact` — signed distance of the closest approach to the origin,
///   positive when the origin lies to the right of the flight direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerigeeCircle {
    pub curvature: f64,
    pub phi0: f64,
    pub impact: f64,
}

impl PerigeeCircle {
    pub fn new(curvature: f64, phi0: f64, impact: f64) -> Self {
        Self {
            curvature,
            phi0,
            impact,
        }
    }

    /// Construct from a geometric circle center, radius, and sense of
    /// rotation (+1 counterclockwise, -1 clockwise).
    pub fn from_center_radius(center: Vector2<f64>, radius: f64, orientation: f64) -> Self {
        let curvature = orientation.signum() / radius;
        let dist = center.norm();
        let impact = orientation.signum() * (radius - dist);
        // Perigee point lies on the segment between origin and center;
        // the tangent there is perpendicular to the center direction.
        let center_phi = center.y.atan2(center.x);
        let phi0 = center_phi - orientation.signum() * std::f64::consts::FRAC_PI_2;
        Self {
            curvature,
            phi0: normalize_angle(phi0),
            impact,
        }
    }

    pub fn is_line(&self) -> bool {
        self.curvature.abs() < CURVATURE_EPS
    }

    pub fn is_finite(&self) -> bool {
        self.curvature.is_finite() && self.phi0.is_finite() && self.impact.is_finite()
    }

    /// Unit tangent at the perigee.
    pub fn tangent(&self) -> Vector2<f64> {
        Vector2::new(self.phi0.cos(), self.phi0.sin())
    }

    /// Unit normal at the perigee, pointing to the left of the flight
    /// direction.
    pub fn normal(&self) -> Vector2<f64> {
        Vector2::new(-self.phi0.sin(), self.phi0.cos())
    }

    /// Point of closest approach to the origin.
    pub fn perigee_point(&self) -> Vector2<f64> {
        self.normal() * self.impact
    }

    /// Center of the circle; meaningless for near-line curvatures.
    pub fn center(&self) -> Vector2<f64> {
        self.normal() * (self.impact + 1.0 / self.curvature)
    }

    pub fn radius(&self) -> f64 {
        1.0 / self.curvature.abs()
    }

    /// Signed distance from a point to the trajectory. Positive values lie
    /// on the side the circle center is on (the left for positive
    /// curvature); for lines this is the signed normal offset.
    pub fn distance(&self, p: Vector2<f64>) -> f64 {
        if self.is_line() {
            self.normal().dot(&p) - self.impact
        } else {
            self.curvature.signum() * (self.radius() - (p - self.center()).norm())
        }
    }

    /// Closest point on the trajectory to `p`.
    pub fn closest_point(&self, p: Vector2<f64>) -> Vector2<f64> {
        if self.is_line() {
            let p0 = self.perigee_point();
            let t = self.tangent();
            p0 + t * t.dot(&(p - p0))
        } else {
            let c = self.center();
            let d = p - c;
            let n = d.norm();
            if n < 1e-12 {
                // Point at the center: any direction works; pick the perigee.
                return self.perigee_point();
            }
            c + d * (self.radius() / n)
        }
    }

    /// Arc length from the perigee to the closest approach of `p`,
    /// measured along the flight direction. For circles the result is
    /// wrapped into one period starting slightly before the perigee so
    /// hits just upstream keep small negative values.
    pub fn arc_length(&self, p: Vector2<f64>) -> f64 {
        if self.is_line() {
            return self.tangent().dot(&(p - self.perigee_point()));
        }
        let c = self.center();
        let a0 = {
            let d = self.perigee_point() - c;
            d.y.atan2(d.x)
        };
        let a1 = {
            let d = p - c;
            d.y.atan2(d.x)
        };
        let mut delta = if self.curvature > 0.0 { a1 - a0 } else { a0 - a1 };
        let tau = std::f64::consts::TAU;
        delta = delta.rem_euclid(tau);
        // Keep points just behind the perigee at small negative arc length
        // instead of almost a full turn ahead.
        if delta > tau - 0.5 {
            delta -= tau;
        }
        delta * self.radius()
    }

    /// Whether `p` lies to the right of the trajectory in flight
    /// direction. Positive signed distance is the left side in both the
    /// circle and the line branch.
    pub fn is_right_of(&self, p: Vector2<f64>) -> bool {
        self.distance(p) < 0.0
    }
}

/// Wrap an angle into (-pi, pi].
pub fn normalize_angle(mut angle: f64) -> f64 {
    let pi = std::f64::consts::PI;
    while angle > pi {
        angle -= 2.0 * pi;
    }
    while angle <= -pi {
        angle += 2.0 * pi;
    }
    angle
}
