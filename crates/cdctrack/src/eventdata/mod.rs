//! Per-event data: the wire-hit arena and the intermediate entities built
//! from it (facets, segments, reconstructed 3D hits, tracks).
//!
//! Entities reference hits by arena index; no entity owns hit storage.
//! The arena is created once per event by [`HitArena::prepare`] and
//! dropped with the event.

mod facet;
mod hit;
mod records;
mod segment;
mod track;

pub use facet::{Facet, RlInfo};
pub use hit::{HitArena, WireHit};
pub use records::{EventRecord, HitRecord};
pub use segment::{RecoHit3d, Segment2d};
pub use track::Track;
