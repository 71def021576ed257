//! Clock following the tokio time driver.

use relayer_topology::Timer;
use tokio::time::Instant;

/// [`Timer`] advancing with the tokio clock, so that leader windows follow a paused test clock.
#[derive(Debug, Clone, Copy)]
pub struct TokioTimer {
    origin: Instant,
    origin_unix: u64,
}

impl TokioTimer {
    /// Creates a timer reading `origin_unix` now.
    pub fn new(origin_unix: u64) -> Self {
        Self {
            origin: Instant::now(),
            origin_unix,
        }
    }
}

impl Timer for TokioTimer {
    fn now_unix(&self) -> u64 {
        self.origin_unix + self.origin.elapsed().as_secs()
    }
}
