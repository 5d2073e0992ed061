//! Cellular automaton machinery: automaton cells, weighted relations, the
//! state-assignment pass, and the best-path follower.
//!
//! Cells live in arenas owned by the caller and are referenced by index;
//! relations are index pairs with a finite weight. NaN never enters a
//! relation store — rejection happens at construction.

mod automaton;
mod cell;
mod path;
mod relation;

pub use automaton::CellularAutomaton;
pub use cell::AutomatonCell;
pub use path::follow_all;
pub use relation::{relations_from, sort_relations, WeightedRelation};
