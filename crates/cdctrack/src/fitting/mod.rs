//! Least-squares machinery: transverse circle fits, s-z line fits, and
//! the axial-stereo fusion that combines both into an uncertain helix.

mod circle;
mod fusion;
mod sz;

pub use circle::{fit_circle, fit_circle_with_drift, CircleFit};
pub use fusion::{fuse_axial_stereo, reconstruct_on_circle};
pub use sz::{fit_sz_line, SzFit};
