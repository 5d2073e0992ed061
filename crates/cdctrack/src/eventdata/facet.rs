//! Facets: ordered triples of neighboring wire hits.

use crate::ca::AutomatonCell;

/// Drift side of a hit relative to the local trajectory direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RlInfo {
    Left,
    Right,
}

impl RlInfo {
    /// Sign convention: left = +1, right = -1, matching the signed
    /// distance of [`crate::geometry::PerigeeCircle::distance`].
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

/// An ordered triple of wire hits (arena indices) spanning two or three
/// adjacent layers, the atomic unit of local direction scoring.
///
/// Facets overlap freely in their hits; the overlap is scored away by the
/// relation weights of the cellular automaton, never forbidden.
#[derive(Debug, Clone)]
pub struct Facet {
    pub start: usize,
    pub middle: usize,
    pub end: usize,
    /// Drift side assignment of (start, middle, end) from the best
    /// tangent-line fit.
    pub rl: [RlInfo; 3],
    /// Direction angle of the fitted tangent line.
    pub tangent_phi: f64,
    /// Chi-square of the tangent-line fit (drift-sigma normalized).
    pub fit_chi2: f64,
    /// Index of the cluster this facet was built from.
    pub cluster: usize,
    pub cell: AutomatonCell,
}

impl Facet {
    pub fn hits(&self) -> [usize; 3] {
        [self.start, self.middle, self.end]
    }

    /// Whether `other` continues this facet: the two share their
    /// overlapping hit pair.
    pub fn is_continued_by(&self, other: &Facet) -> bool {
        self.middle == other.start && self.end == other.middle
    }
}
