//! Axial-stereo fusion: combine a transverse circle fit with stereo z
//! information into one uncertain helix.

use nalgebra::{Matrix2, SMatrix, Vector2};

use super::circle::distance_gradient;
use super::{fit_sz_line, CircleFit, SzFit};
use crate::eventdata::{RecoHit3d, WireHit};
use crate::geometry::{Helix, PerigeeCircle, UncertainHelix};
use crate::topology::CdcLayout;

/// Displace a stereo hit along its skewed wire until it lies on the
/// reference transverse trajectory, yielding the reconstructed z.
///
/// Axial hits reconstruct at the wire reference position with `z = NaN`.
/// Returns `None` when no crossing exists within (a small margin around)
/// the active wire length, or when the trajectory is not finite — the
/// hit is then unusable for this trajectory, which is an ordinary data
/// condition, not an error.
pub fn reconstruct_on_circle(
    hit_index: usize,
    hit: &WireHit,
    circle: &PerigeeCircle,
    layout: &CdcLayout,
) -> Option<RecoHit3d> {
    if !circle.is_finite() {
        return None;
    }
    let slope = layout.stereo_slope(hit.wire);
    if slope == 0.0 {
        let pos = circle.closest_point(hit.ref_pos);
        return Some(RecoHit3d {
            hit: hit_index,
            pos,
            z: f64::NAN,
            arc_length: circle.arc_length(pos),
        });
    }

    let phi = layout.wire_phi(hit.wire);
    let tangent = Vector2::new(-phi.sin(), phi.cos());
    let half_length = layout.half_length(hit.wire);
    let z = solve_wire_crossing(circle, hit.ref_pos, tangent * slope, half_length)?;
    let wire_pos = hit.ref_pos + tangent * (slope * z);
    let pos = circle.closest_point(wire_pos);
    Some(RecoHit3d {
        hit: hit_index,
        pos,
        z,
        arc_length: circle.arc_length(pos),
    })
}

/// Solve for the z where the swept wire position crosses the trajectory.
///
/// The wire position is `ref + dir * z`. For circles this is a quadratic
/// in z; for lines it is linear. The closed forms never divide by the
/// curvature, so near-line trajectories stay well conditioned.
fn solve_wire_crossing(
    circle: &PerigeeCircle,
    ref_pos: Vector2<f64>,
    dir: Vector2<f64>,
    half_length: f64,
) -> Option<f64> {
    let z_max = half_length * 1.05;
    if circle.is_line() {
        let n = circle.normal();
        let denom = n.dot(&dir);
        if denom.abs() < 1e-12 {
            return None;
        }
        let z = (circle.impact - n.dot(&ref_pos)) / denom;
        return (z.abs() <= z_max).then_some(z);
    }

    let center = circle.center();
    let radius = circle.radius();
    let rel = ref_pos - center;
    let a = dir.norm_squared();
    let b = 2.0 * rel.dot(&dir);
    let c = rel.norm_squared() - radius * radius;
    if a < 1e-18 {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let z1 = (-b + sq) / (2.0 * a);
    let z2 = (-b - sq) / (2.0 * a);
    // The physical solution is the one closer to the chamber midplane.
    let z = if z1.abs() <= z2.abs() { z1 } else { z2 };
    (z.abs() <= z_max).then_some(z)
}

/// Combine an axial circle fit with stereo hits into an uncertain helix.
///
/// The stereo hits are reconstructed on the circle and fitted in the
/// (arc length, z) plane; the 5x5 helix covariance propagates the circle
/// covariance into the s-z parameters through a numerically evaluated
/// Jacobian (the s-z fit shifts when the circle parameters move). The
/// first pass fits the raw wire crossings with the full drift band as
/// the z uncertainty; every further iteration resolves the drift side
/// along the wire against the previous s-z line and refits with the
/// side-resolved z and a tightened sigma.
///
/// Returns `None` when the circle is degenerate (non-finite parameters)
/// or fewer than two stereo hits reconstruct onto it.
pub fn fuse_axial_stereo(
    circle_fit: &CircleFit,
    stereo_hits: &[(usize, &WireHit)],
    layout: &CdcLayout,
    iterations: usize,
) -> Option<UncertainHelix> {
    if !circle_fit.circle.is_finite() {
        return None;
    }
    let circle = circle_fit.circle;

    let mut sz_fit = sz_fit_against(&circle, stereo_hits, layout, None)?;
    for _ in 1..iterations.max(1) {
        sz_fit = sz_fit_against(&circle, stereo_hits, layout, Some(&sz_fit))?;
    }
    let prior = (iterations > 1).then_some(&sz_fit);

    // Jacobian of (tan_lambda, z0) under circle parameter shifts.
    const EPS: [f64; 3] = [1e-7, 1e-6, 1e-5];
    let mut k = SMatrix::<f64, 2, 3>::zeros();
    for j in 0..3 {
        let mut pert = circle;
        match j {
            0 => pert.curvature += EPS[j],
            1 => pert.phi0 += EPS[j],
            _ => pert.impact += EPS[j],
        }
        if let Some(shifted) = sz_fit_against(&pert, stereo_hits, layout, prior) {
            k[(0, j)] = (shifted.tan_lambda - sz_fit.tan_lambda) / EPS[j];
            k[(1, j)] = (shifted.z0 - sz_fit.z0) / EPS[j];
        }
    }

    let c3 = circle_fit.covariance;
    let c2: Matrix2<f64> = sz_fit.covariance;
    let mut cov = SMatrix::<f64, 5, 5>::zeros();
    cov.fixed_view_mut::<3, 3>(0, 0).copy_from(&c3);
    let cross = k * c3;
    cov.fixed_view_mut::<2, 3>(3, 0).copy_from(&cross);
    cov.fixed_view_mut::<3, 2>(0, 3).copy_from(&cross.transpose());
    cov.fixed_view_mut::<2, 2>(3, 3)
        .copy_from(&(c2 + cross * k.transpose()));

    let helix = Helix::from_circle_and_sz(circle, sz_fit.tan_lambda, sz_fit.z0);
    if !helix.is_finite() {
        return None;
    }
    Some(UncertainHelix {
        helix,
        covariance: cov,
        chi2: circle_fit.chi2 + sz_fit.chi2,
        ndf: circle_fit.ndf + sz_fit.ndf,
    })
}

/// Fit the s-z line of the stereo hits against `circle`.
///
/// Without a prior the crossing ignores which side of the wire the
/// particle passed, so the transverse uncertainty is the full drift
/// length plus its variance, mapped onto z through the inverse skew.
/// With a prior s-z line the side is resolved: the crossing z is
/// displaced by the drift length over the local distance-per-z rate,
/// towards the prior prediction, and the band sigma shrinks to half.
fn sz_fit_against(
    circle: &PerigeeCircle,
    stereo_hits: &[(usize, &WireHit)],
    layout: &CdcLayout,
    prior: Option<&SzFit>,
) -> Option<SzFit> {
    let mut arcs = Vec::with_capacity(stereo_hits.len());
    let mut zs = Vec::with_capacity(stereo_hits.len());
    let mut sigmas = Vec::with_capacity(stereo_hits.len());
    for &(index, hit) in stereo_hits {
        let Some(reco) = reconstruct_on_circle(index, hit, circle, layout) else {
            continue;
        };
        if !reco.z.is_finite() {
            continue;
        }
        let slope = layout.stereo_slope(hit.wire);
        let mut z = reco.z;
        let mut transverse = (hit.drift_length * hit.drift_length + hit.drift_variance).sqrt();
        if let Some(prior) = prior {
            let phi = layout.wire_phi(hit.wire);
            let dir = Vector2::new(-phi.sin(), phi.cos()) * slope;
            let wire_pos = hit.ref_pos + dir * z;
            let rate = distance_gradient(circle, wire_pos).dot(&dir);
            if rate.abs() > 1e-6 {
                let dz = hit.drift_length / rate;
                let z_pred = prior.z0 + prior.tan_lambda * reco.arc_length;
                z = if (z + dz - z_pred).abs() <= (z - dz - z_pred).abs() {
                    z + dz
                } else {
                    z - dz
                };
                transverse =
                    (0.25 * hit.drift_length * hit.drift_length + hit.drift_variance).sqrt();
            }
        }
        arcs.push(reco.arc_length);
        zs.push(z);
        sigmas.push(transverse.max(1e-4) / slope.abs().max(1e-6));
    }
    if arcs.len() < 2 {
        return None;
    }
    fit_sz_line(&arcs, &zs, &sigmas)
}
