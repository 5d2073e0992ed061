//! Weighted algebraic circle fit with drift-length residuals.

use nalgebra::{Matrix3, Vector2, Vector3};

use crate::geometry::PerigeeCircle;

/// Result of a transverse circle fit.
#[derive(Debug, Clone)]
pub struct CircleFit {
    pub circle: PerigeeCircle,
    /// Covariance over (curvature, phi0, impact).
    pub covariance: Matrix3<f64>,
    pub chi2: f64,
    pub ndf: usize,
}

/// Fit a circle through weighted points (algebraic Kasa fit), orienting
/// the curvature sign so the trajectory traverses the points in their
/// given order.
///
/// Collinear input degrades gracefully into a straight-line fit. Returns
/// `None` only when fewer than three points are given or the input is
/// numerically hopeless.
pub fn fit_circle(positions: &[Vector2<f64>], sigmas: &[f64]) -> Option<CircleFit> {
    fit_circle_with_drift(positions, &vec![0.0; positions.len()], &vec![], sigmas)
}

/// Fit a circle to wire positions with signed drift-length offsets.
///
/// `rl_signs` gives the drift side per point (+1 left, -1 right); when
/// empty, all drifts are treated as zero-offset (plain point fit). The
/// fit alternates between displacing each wire center onto its drift
/// circle towards the current trajectory and refitting, which converges
/// in two rounds for track-like inputs.
pub fn fit_circle_with_drift(
    positions: &[Vector2<f64>],
    drifts: &[f64],
    rl_signs: &[f64],
    sigmas: &[f64],
) -> Option<CircleFit> {
    let n = positions.len();
    if n < 3 || sigmas.len() != n || drifts.len() != n {
        return None;
    }
    let use_drift = !rl_signs.is_empty();
    if use_drift && rl_signs.len() != n {
        return None;
    }

    let mut points: Vec<Vector2<f64>> = positions.to_vec();
    let mut circle = kasa_or_line(&points, sigmas, positions)?;

    let rounds = if use_drift { 2 } else { 0 };
    for _ in 0..rounds {
        for (i, p) in points.iter_mut().enumerate() {
            // Displace the wire center against the distance gradient by
            // the signed drift length, so that a point whose trajectory
            // distance equals rl * drift lands on the trajectory.
            let grad = distance_gradient(&circle, positions[i]);
            *p = positions[i] - grad * (rl_signs[i] * drifts[i]);
        }
        circle = kasa_or_line(&points, sigmas, positions)?;
    }

    if !circle.is_finite() {
        return None;
    }

    // Chi-square over signed distance residuals against the drift length.
    let chi2 = chi2_of(&circle, positions, drifts, rl_signs, sigmas);
    let ndf = n.saturating_sub(3).max(1);
    let covariance = numerical_covariance(&circle, positions, drifts, rl_signs, sigmas)
        .unwrap_or_else(|| Matrix3::identity() * 1e-2);

    Some(CircleFit {
        circle,
        covariance,
        chi2,
        ndf,
    })
}

/// Unit gradient of the signed trajectory distance at `p`.
pub(crate) fn distance_gradient(circle: &PerigeeCircle, p: Vector2<f64>) -> Vector2<f64> {
    if circle.is_line() {
        return circle.normal();
    }
    let d = p - circle.center();
    let n = d.norm();
    if n < 1e-9 {
        return circle.normal();
    }
    -circle.curvature.signum() * d / n
}

/// Signed residual of one point: trajectory distance minus the signed
/// drift length.
fn residual(
    circle: &PerigeeCircle,
    position: Vector2<f64>,
    drift: f64,
    rl_sign: f64,
) -> f64 {
    circle.distance(position) - rl_sign * drift
}

fn chi2_of(
    circle: &PerigeeCircle,
    positions: &[Vector2<f64>],
    drifts: &[f64],
    rl_signs: &[f64],
    sigmas: &[f64],
) -> f64 {
    positions
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let rl = rl_signs.get(i).copied().unwrap_or(0.0);
            let r = residual(circle, p, drifts[i], rl);
            (r / sigmas[i]).powi(2)
        })
        .sum()
}

/// Algebraic Kasa fit; falls back to a total-least-squares line when the
/// normal equations are singular (collinear points).
fn kasa_or_line(
    points: &[Vector2<f64>],
    sigmas: &[f64],
    order_hint: &[Vector2<f64>],
) -> Option<PerigeeCircle> {
    let mut m = Matrix3::zeros();
    let mut rhs = Vector3::zeros();
    for (p, s) in points.iter().zip(sigmas) {
        let w = 1.0 / (s * s);
        let z = p.norm_squared();
        let row = Vector3::new(p.x, p.y, 1.0);
        m += w * row * row.transpose();
        rhs -= w * z * row;
    }
    if let Some(sol) = m.lu().solve(&rhs) {
        let center = Vector2::new(-sol[0] * 0.5, -sol[1] * 0.5);
        let r2 = center.norm_squared() - sol[2];
        if r2.is_finite() && r2 > 1e-12 {
            let radius = r2.sqrt();
            // Tiny curvature relative to the point spread means the arc is
            // indistinguishable from a line; prefer the stable line fit.
            let spread = (points[points.len() - 1] - points[0]).norm();
            if radius < 1e4 * spread.max(1.0) {
                let orientation = orientation_of(order_hint, center);
                return Some(PerigeeCircle::from_center_radius(center, radius, orientation));
            }
        }
    }
    fit_line(points, sigmas)
}

/// Sense of rotation of the ordered points around the center.
fn orientation_of(points: &[Vector2<f64>], center: Vector2<f64>) -> f64 {
    let mut cross_sum = 0.0;
    for pair in points.windows(2) {
        let a = pair[0] - center;
        let b = pair[1] - center;
        cross_sum += a.x * b.y - a.y * b.x;
    }
    if cross_sum >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Weighted total-least-squares line, encoded as a zero-curvature perigee.
fn fit_line(points: &[Vector2<f64>], sigmas: &[f64]) -> Option<PerigeeCircle> {
    let mut w_sum = 0.0;
    let mut mean = Vector2::zeros();
    for (p, s) in points.iter().zip(sigmas) {
        let w = 1.0 / (s * s);
        w_sum += w;
        mean += w * p;
    }
    if w_sum <= 0.0 {
        return None;
    }
    mean /= w_sum;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (p, s) in points.iter().zip(sigmas) {
        let w = 1.0 / (s * s);
        let d = p - mean;
        sxx += w * d.x * d.x;
        sxy += w * d.x * d.y;
        syy += w * d.y * d.y;
    }
    // Dominant eigenvector of the scatter matrix is the line direction.
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let mut dir = Vector2::new(theta.cos(), theta.sin());
    // Orient along the point ordering.
    if dir.dot(&(points[points.len() - 1] - points[0])) < 0.0 {
        dir = -dir;
    }
    let phi0 = dir.y.atan2(dir.x);
    let normal = Vector2::new(-dir.y, dir.x);
    let impact = normal.dot(&mean);
    Some(PerigeeCircle::new(0.0, phi0, impact))
}

/// Parameter covariance from the numerical Jacobian of the residuals.
fn numerical_covariance(
    circle: &PerigeeCircle,
    positions: &[Vector2<f64>],
    drifts: &[f64],
    rl_signs: &[f64],
    sigmas: &[f64],
) -> Option<Matrix3<f64>> {
    const EPS: [f64; 3] = [1e-7, 1e-6, 1e-5];
    let mut jtj = Matrix3::zeros();
    for (i, &p) in positions.iter().enumerate() {
        let rl = rl_signs.get(i).copied().unwrap_or(0.0);
        let base = residual(circle, p, drifts[i], rl);
        let mut grad = Vector3::zeros();
        for k in 0..3 {
            let mut pert = *circle;
            match k {
                0 => pert.curvature += EPS[0],
                1 => pert.phi0 += EPS[1],
                _ => pert.impact += EPS[2],
            }
            grad[k] = (residual(&pert, p, drifts[i], rl) - base) / EPS[k];
        }
        let w = 1.0 / (sigmas[i] * sigmas[i]);
        jtj += w * grad * grad.transpose();
    }
    let inv = jtj.try_inverse()?;
    inv.iter().all(|v| v.is_finite()).then_some(inv)
}
