//! Track pattern recognition for a central drift chamber.
//!
//! Turns the unordered, noisy wire hits of one collision event into a
//! small set of ordered trajectories. The pipeline runs leaves first:
//!
//! 1. hit preparation into a per-event arena ([`eventdata`]),
//! 2. clustering with background tagging ([`clustering`]),
//! 3. the Legendre quad-tree search seeding axial candidates ([`hough`]),
//! 4. facet and segment construction through a cellular automaton
//!    ([`segments`], [`ca`]),
//! 5. axial-stereo segment pairing and helix fusion ([`tracks`],
//!    [`fitting`]),
//! 6. cleanup establishing exclusive hit ownership ([`tracks`]),
//! 7. export of serializable track records ([`pipeline`]).
//!
//! Scoring everywhere goes through the pluggable [`filters`] layer with
//! NaN as the universal rejection sentinel. Stages are single-threaded
//! per event; run separate [`pipeline::TrackFinder`] instances to
//! process events in parallel.

pub mod ca;
pub mod clustering;
pub mod eventdata;
pub mod filters;
pub mod fitting;
pub mod geometry;
pub mod hough;
pub mod pipeline;
pub mod segments;
pub mod sim;
pub mod topology;
pub mod tracks;

pub use pipeline::{ConfigError, TrackFinder, TrackingConfig, TrackingResult};
