//! Logical time used to order voxel modifications and mesh extractions.

use crate::constants::INITIAL_TIMESTAMP;

/// Logical timestamp. Monotonic counter, unrelated to wall-clock time.
pub type Timestamp = u64;

/// Explicit logical clock owned by an octree.
///
/// Advanced only by the owner's update call, so staleness comparisons are
/// deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogicalClock {
    now: Timestamp,
}

impl LogicalClock {
    /// Create a clock starting at the given time.
    pub const fn starting_at(now: Timestamp) -> Self {
        Self { now }
    }

    /// Current time.
    #[inline]
    pub const fn now(&self) -> Timestamp {
        self.now
    }

    /// Advance the clock and return the new time.
    ///
    /// Saturates instead of wrapping so time never runs backwards.
    pub fn advance(&mut self, dt: Timestamp) -> Timestamp {
        self.now = self.now.saturating_add(dt);
        self.now
    }
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::starting_at(INITIAL_TIMESTAMP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_initial_timestamp() {
        assert_eq!(LogicalClock::default().now(), INITIAL_TIMESTAMP);
    }

    #[test]
    fn advance_is_monotonic() {
        let mut clock = LogicalClock::starting_at(10);
        assert_eq!(clock.advance(5), 15);
        assert_eq!(clock.advance(0), 15);
        assert_eq!(clock.now(), 15);
    }

    #[test]
    fn advance_saturates() {
        let mut clock = LogicalClock::starting_at(Timestamp::MAX - 1);
        assert_eq!(clock.advance(10), Timestamp::MAX);
    }
}
