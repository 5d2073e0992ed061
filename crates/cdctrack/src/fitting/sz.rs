//! Weighted straight-line fit in the (arc length, z) plane.

use nalgebra::Matrix2;

/// Result of an s-z line fit: `z = z0 + tan_lambda * s`.
#[derive(Debug, Clone)]
pub struct SzFit {
    pub tan_lambda: f64,
    pub z0: f64,
    /// Covariance over (tan_lambda, z0).
    pub covariance: Matrix2<f64>,
    pub chi2: f64,
    pub ndf: usize,
}

/// Fit the z motion versus 2D arc length.
///
/// Returns `None` with fewer than two points or when all arc lengths
/// coincide (the slope is then unconstrained).
pub fn fit_sz_line(arc_lengths: &[f64], zs: &[f64], sigmas: &[f64]) -> Option<SzFit> {
    let n = arc_lengths.len();
    if n < 2 || zs.len() != n || sigmas.len() != n {
        return None;
    }

    let (mut sw, mut ss, mut sz, mut sss, mut ssz) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for i in 0..n {
        let w = 1.0 / (sigmas[i] * sigmas[i]);
        sw += w;
        ss += w * arc_lengths[i];
        sz += w * zs[i];
        sss += w * arc_lengths[i] * arc_lengths[i];
        ssz += w * arc_lengths[i] * zs[i];
    }
    let det = sw * sss - ss * ss;
    // Relative threshold: a spread-free sample cancels to rounding noise.
    if !det.is_finite() || det.abs() <= 1e-9 * (sw * sss).abs() {
        return None;
    }
    let tan_lambda = (sw * ssz - ss * sz) / det;
    let z0 = (sss * sz - ss * ssz) / det;
    if !tan_lambda.is_finite() || !z0.is_finite() {
        return None;
    }

    let covariance = Matrix2::new(sw / det, -ss / det, -ss / det, sss / det);
    let chi2: f64 = (0..n)
        .map(|i| {
            let r = zs[i] - z0 - tan_lambda * arc_lengths[i];
            (r / sigmas[i]).powi(2)
        })
        .sum();

    Some(SzFit {
        tan_lambda,
        z0,
        covariance,
        chi2,
        ndf: n.saturating_sub(2).max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_is_recovered() {
        let s = [10.0, 20.0, 30.0, 40.0];
        let z: Vec<f64> = s.iter().map(|s| -4.0 + 0.3 * s).collect();
        let sig = [0.5; 4];
        let fit = fit_sz_line(&s, &z, &sig).unwrap();
        assert!((fit.tan_lambda - 0.3).abs() < 1e-12);
        assert!((fit.z0 + 4.0).abs() < 1e-10);
        assert!(fit.chi2 < 1e-18);
        assert_eq!(fit.ndf, 2);
    }

    #[test]
    fn degenerate_arc_lengths_yield_none() {
        let s = [5.0, 5.0, 5.0];
        let z = [1.0, 2.0, 3.0];
        let sig = [0.5; 3];
        assert!(fit_sz_line(&s, &z, &sig).is_none());
    }
}
