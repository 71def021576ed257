use std::time::Duration;

pub(crate) const DEFAULT_THREAD_COUNT: u8 = 4;

/// How often the ledgers are inspected for completed batches.
pub(crate) const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

pub(crate) const FIRST_DEPOSIT_NONCE: u64 = 1;
