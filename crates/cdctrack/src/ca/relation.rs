//! Weighted directed relations between arena-indexed cells.

/// A directed edge `from -> to` with a finite acceptance weight.
///
/// Construction rejects non-finite weights, so a NaN produced by a filter
/// never reaches a relation store and downstream traversals need no NaN
/// checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedRelation {
    pub from: usize,
    pub weight: f64,
    pub to: usize,
}

impl WeightedRelation {
    /// Build a relation if the weight is finite; NaN (and infinities) mean
    /// "not a neighbor".
    pub fn accept(from: usize, weight: f64, to: usize) -> Option<Self> {
        weight.is_finite().then_some(Self { from, weight, to })
    }
}

/// Sort relations by source index, then by weight descending so that the
/// best continuation of a cell comes first in its slice.
pub fn sort_relations(relations: &mut [WeightedRelation]) {
    relations.sort_by(|a, b| {
        a.from
            .cmp(&b.from)
            .then_with(|| b.weight.total_cmp(&a.weight))
    });
}

/// Slice of relations leaving `from`, assuming `relations` is sorted with
/// [`sort_relations`].
pub fn relations_from(relations: &[WeightedRelation], from: usize) -> &[WeightedRelation] {
    let lo = relations.partition_point(|r| r.from < from);
    let hi = relations.partition_point(|r| r.from <= from);
    &relations[lo..hi]
}
