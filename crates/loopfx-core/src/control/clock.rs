//! Logical clock for parameter freshness
//!
//! The arbiter only needs a total order between updates, not wall-clock
//! time, so every update draws the next value of a shared counter. Two
//! updates can never share a timestamp, and 0 is reserved for "never set".

use std::sync::atomic::{AtomicU32, Ordering};

/// Freshness stamp of a parameter update (0 = never written)
pub type Timestamp = u32;

/// Monotonic stamp source shared by every control-rate writer
pub struct ControlClock {
    counter: AtomicU32,
}

impl ControlClock {
    pub fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
        }
    }

    /// Next timestamp, strictly greater than every earlier one
    ///
    /// Skips 0 if the counter ever wraps.
    #[inline]
    pub fn now(&self) -> Timestamp {
        let stamp = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if stamp == 0 {
            self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
        } else {
            stamp
        }
    }

    /// Most recently issued timestamp
    pub fn last(&self) -> Timestamp {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for ControlClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamps_strictly_increase() {
        let clock = ControlClock::new();
        let first = clock.now();
        let second = clock.now();
        assert_eq!(first, 1, "0 is reserved for never-set");
        assert!(second > first);
        assert_eq!(clock.last(), second);
    }

    #[test]
    fn test_wrap_skips_zero() {
        let clock = ControlClock {
            counter: AtomicU32::new(u32::MAX),
        };
        assert_eq!(clock.now(), 1);
    }
}
