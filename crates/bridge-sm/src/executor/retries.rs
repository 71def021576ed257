//! Bounded retry counters.

/// Counts retries up to a fixed budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryCounter {
    count: u64,
    max: u64,
}

impl RetryCounter {
    /// Creates a counter allowing `max` retries.
    pub const fn new(max: u64) -> Self {
        Self { count: 0, max }
    }

    /// Returns `true` once `max` retries were consumed, otherwise consumes one and returns
    /// `false`.
    pub fn process(&mut self) -> bool {
        if self.count < self.max {
            self.count += 1;
            return false;
        }

        true
    }

    /// Restores the full budget.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// The number of retries consumed so far.
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// The retry budget.
    pub const fn max(&self) -> u64 {
        self.max
    }
}
