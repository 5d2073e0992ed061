//! Monte-Carlo truth lookup for the `truth` filter variants.

use crate::eventdata::HitArena;

/// Per-event hit-to-particle table, built once from the arena.
///
/// Hits without truth information (real data, or noise in simulation)
/// map to `None` and never satisfy a purity test.
#[derive(Debug, Clone)]
pub struct McTruth {
    particle_of: Vec<Option<u32>>,
}

impl McTruth {
    pub fn from_arena(arena: &HitArena) -> Self {
        Self {
            particle_of: arena.hits.iter().map(|h| h.mc_particle).collect(),
        }
    }

    pub fn particle_of(&self, hit: usize) -> Option<u32> {
        self.particle_of.get(hit).copied().flatten()
    }

    /// Whether all given hits stem from one and the same particle.
    pub fn all_same_particle(&self, hits: impl IntoIterator<Item = usize>) -> bool {
        let mut particle = None;
        for hit in hits {
            match (particle, self.particle_of(hit)) {
                (_, None) => return false,
                (None, found) => particle = found,
                (Some(p), Some(q)) if p != q => return false,
                _ => {}
            }
        }
        particle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventdata::{EventRecord, HitRecord};
    use crate::topology::{CdcLayout, WireId};

    #[test]
    fn purity_requires_one_known_particle() {
        let layout = CdcLayout::default();
        let records = vec![
            HitRecord {
                wire: WireId::new(0, 0, 0),
                drift_length: 0.1,
                drift_variance: 1e-4,
                mc_particle: Some(7),
            },
            HitRecord {
                wire: WireId::new(0, 1, 0),
                drift_length: 0.1,
                drift_variance: 1e-4,
                mc_particle: Some(7),
            },
            HitRecord {
                wire: WireId::new(0, 2, 0),
                drift_length: 0.1,
                drift_variance: 1e-4,
                mc_particle: None,
            },
        ];
        let arena = HitArena::prepare(&EventRecord { hits: records }, &layout);
        let truth = McTruth::from_arena(&arena);
        assert!(truth.all_same_particle([0, 1]));
        assert!(!truth.all_same_particle([0, 1, 2]));
        assert!(!truth.all_same_particle(std::iter::empty()));
    }
}
