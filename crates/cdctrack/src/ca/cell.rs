//! Per-item state used by the cellular automaton.

/// Mutable automaton state attached to hits, facets, and segment pairs.
///
/// `weight` is the gain for picking up the item (e.g. the number of fresh
/// hits it contributes), `state` is assigned by the automaton as the best
/// achievable path score starting at this cell. The flags mark lifecycle
/// conditions; `TAKEN`, once set on a hit within an event, is never
/// cleared again.
#[derive(Debug, Clone, Copy)]
pub struct AutomatonCell {
    pub weight: f64,
    pub state: f64,
    flags: u8,
}

impl AutomatonCell {
    pub const ASSIGNED: u8 = 1 << 0;
    pub const CYCLE: u8 = 1 << 1;
    pub const MASKED: u8 = 1 << 2;
    pub const TAKEN: u8 = 1 << 3;
    pub const BACKGROUND: u8 = 1 << 4;

    pub fn with_weight(weight: f64) -> Self {
        Self {
            weight,
            state: 0.0,
            flags: 0,
        }
    }

    pub fn set(&mut self, flag: u8) {
        self.flags |= flag;
    }

    pub fn unset(&mut self, flag: u8) {
        debug_assert!(
            flag & Self::TAKEN == 0,
            "the taken flag must not be cleared within an event"
        );
        self.flags &= !flag;
    }

    pub fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Cells that the automaton and the path follower may not traverse.
    pub fn is_blocked(&self) -> bool {
        self.has(Self::MASKED | Self::CYCLE | Self::TAKEN)
    }
}

impl Default for AutomatonCell {
    fn default() -> Self {
        Self::with_weight(1.0)
    }
}
