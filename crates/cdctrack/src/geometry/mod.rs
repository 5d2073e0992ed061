//! Trajectory geometry: perigee circles in the transverse plane and 3D
//! helices with covariance.

mod helix;
mod perigee;

pub use helix::{Helix, HelixCovariance, UncertainHelix};
pub use perigee::{normalize_angle, PerigeeCircle};

/// Curvatures below this magnitude are treated as straight lines.
pub const CURVATURE_EPS: f64 = 1e-6;
