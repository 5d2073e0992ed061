//! Filters over facets and facet-continuation relations.

use crate::ca::AutomatonCell;
use crate::eventdata::{Facet, HitArena};
use crate::geometry::normalize_angle;

use super::{FilterChoice, McTruth, Recorder};

/// Scores a candidate facet; the weight becomes the facet's cell weight.
#[derive(Debug)]
pub struct FacetFilter {
    choice: FilterChoice,
    /// Upper cut on the tangent-line fit chi-square.
    chi2_cut: f64,
    /// Cell weight of an accepted facet (one per fresh hit it covers).
    weight: f64,
    recorder: Recorder,
}

impl FacetFilter {
    pub fn new(choice: FilterChoice, chi2_cut: f64, weight: f64) -> Self {
        Self {
            choice,
            chi2_cut,
            weight,
            recorder: Recorder::new(vec!["fit_chi2", "tangent_phi", "truth"]),
        }
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn score(&self, facet: &Facet, arena: &HitArena, truth: Option<&McTruth>) -> f64 {
        match self.choice {
            FilterChoice::None => f64::NAN,
            FilterChoice::All => self.weight,
            FilterChoice::Simple => self.simple(facet, arena),
            FilterChoice::Truth => match truth {
                Some(t) if t.all_same_particle(facet.hits()) => self.weight,
                _ => f64::NAN,
            },
            FilterChoice::Recording => {
                let label = truth
                    .map(|t| t.all_same_particle(facet.hits()) as u8 as f64)
                    .unwrap_or(f64::NAN);
                self.recorder
                    .record(vec![facet.fit_chi2, facet.tangent_phi, label]);
                self.simple(facet, arena)
            }
        }
    }

    fn simple(&self, facet: &Facet, arena: &HitArena) -> f64 {
        let background = facet
            .hits()
            .iter()
            .any(|&i| arena.hits[i].cell.has(AutomatonCell::BACKGROUND));
        if background || facet.fit_chi2 > self.chi2_cut {
            f64::NAN
        } else {
            self.weight
        }
    }
}

/// Scores a continuation relation between two facets sharing a hit pair.
#[derive(Debug)]
pub struct FacetRelationFilter {
    choice: FilterChoice,
    /// Maximum tangent direction change between the two facets (rad).
    max_deflection: f64,
    /// Relation weight of an accepted continuation; negative so that a
    /// path state counts distinct hits, not facets.
    weight: f64,
    recorder: Recorder,
}

impl FacetRelationFilter {
    pub fn new(choice: FilterChoice, max_deflection: f64, weight: f64) -> Self {
        Self {
            choice,
            max_deflection,
            weight,
            recorder: Recorder::new(vec!["deflection", "truth"]),
        }
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn score(&self, from: &Facet, to: &Facet, truth: Option<&McTruth>) -> f64 {
        match self.choice {
            FilterChoice::None => f64::NAN,
            FilterChoice::All => self.weight,
            FilterChoice::Simple => self.simple(from, to),
            FilterChoice::Truth => match truth {
                Some(t)
                    if t.all_same_particle(from.hits().into_iter().chain(to.hits())) =>
                {
                    self.weight
                }
                _ => f64::NAN,
            },
            FilterChoice::Recording => {
                let deflection = normalize_angle(to.tangent_phi - from.tangent_phi).abs();
                let label = truth
                    .map(|t| {
                        t.all_same_particle(from.hits().into_iter().chain(to.hits())) as u8 as f64
                    })
                    .unwrap_or(f64::NAN);
                self.recorder.record(vec![deflection, label]);
                self.simple(from, to)
            }
        }
    }

    fn simple(&self, from: &Facet, to: &Facet) -> f64 {
        // The shared hit pair must carry the same drift-side reading in
        // both facets, otherwise the chain kinks through a wire.
        if from.rl[1] != to.rl[0] || from.rl[2] != to.rl[1] {
            return f64::NAN;
        }
        let deflection = normalize_angle(to.tangent_phi - from.tangent_phi).abs();
        if deflection > self.max_deflection {
            f64::NAN
        } else {
            self.weight
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventdata::RlInfo;

    fn facet(start: usize, rl: [RlInfo; 3], phi: f64, chi2: f64) -> Facet {
        Facet {
            start,
            middle: start + 1,
            end: start + 2,
            rl,
            tangent_phi: phi,
            fit_chi2: chi2,
            cluster: 0,
            cell: AutomatonCell::with_weight(3.0),
        }
    }

    fn empty_arena() -> HitArena {
        HitArena::default()
    }

    #[test]
    fn none_rejects_and_all_accepts() {
        let arena = empty_arena();
        let f = facet(0, [RlInfo::Left; 3], 0.0, 0.1);
        // Hit indices are never dereferenced by these variants.
        let none = FacetFilter::new(FilterChoice::None, 10.0, 3.0);
        let all = FacetFilter::new(FilterChoice::All, 10.0, 3.0);
        assert!(none.score(&f, &arena, None).is_nan());
        assert_eq!(all.score(&f, &arena, None), 3.0);
    }

    #[test]
    fn relation_rejects_inconsistent_drift_sides() {
        let a = facet(0, [RlInfo::Left, RlInfo::Left, RlInfo::Right], 0.0, 0.1);
        let consistent = facet(1, [RlInfo::Left, RlInfo::Right, RlInfo::Right], 0.05, 0.1);
        let flipped = facet(1, [RlInfo::Right, RlInfo::Right, RlInfo::Right], 0.05, 0.1);
        let filter = FacetRelationFilter::new(FilterChoice::Simple, 0.3, -2.0);
        assert_eq!(filter.score(&a, &consistent, None), -2.0);
        assert!(filter.score(&a, &flipped, None).is_nan());
    }

    #[test]
    fn relation_rejects_large_deflection() {
        let a = facet(0, [RlInfo::Left; 3], 0.0, 0.1);
        let kinked = facet(1, [RlInfo::Left; 3], 1.2, 0.1);
        let filter = FacetRelationFilter::new(FilterChoice::Simple, 0.3, -2.0);
        assert!(filter.score(&a, &kinked, None).is_nan());
    }

    #[test]
    fn recording_collects_rows_and_scores_like_simple() {
        let a = facet(0, [RlInfo::Left; 3], 0.0, 0.1);
        let b = facet(1, [RlInfo::Left; 3], 0.05, 0.1);
        let filter = FacetRelationFilter::new(FilterChoice::Recording, 0.3, -2.0);
        assert_eq!(filter.score(&a, &b, None), -2.0);
        assert_eq!(filter.recorder().len(), 1);
    }
}
