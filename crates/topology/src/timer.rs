//! Clock sources used for leader election.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// A source of the current unix time.
pub trait Timer: Send + Sync + fmt::Debug {
    /// Returns the number of seconds elapsed since the unix epoch.
    fn now_unix(&self) -> u64;
}

/// [`Timer`] backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimer;

impl Timer for SystemTimer {
    fn now_unix(&self) -> u64 {
        // a clock set before the epoch is treated as the epoch itself
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// [`Timer`] whose time only moves when told to.
///
/// Useful to run several relayers against a shared, controllable clock.
#[derive(Debug, Default)]
pub struct ManualTimer {
    now: AtomicU64,
}

impl ManualTimer {
    /// Creates a timer frozen at `now` seconds since the epoch.
    pub const fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Sets the current time.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Moves the current time forward by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_timer() {
        let timer = ManualTimer::new(25);
        assert_eq!(timer.now_unix(), 25);

        timer.advance(10);
        assert_eq!(timer.now_unix(), 35);

        timer.set(1);
        assert_eq!(timer.now_unix(), 1);
    }

    #[test]
    fn test_system_timer_is_after_2020() {
        assert!(SystemTimer.now_unix() > 1_577_836_800);
    }
}
