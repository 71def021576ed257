//! Names of the metrics published by the relayer.

/// Last error or warning logged by an executor.
pub const METRIC_LAST_ERROR: &str = "last encountered error";

/// Identifier of the step a driver is currently executing.
pub const METRIC_CURRENT_STEP: &str = "current state machine step";

/// Number of batches executed so far.
pub const METRIC_NUM_BATCHES: &str = "num batches";

/// Number of deposits reported as executed.
pub const METRIC_NUM_TRANSACTIONS_SUCCEEDED: &str = "num transactions succeeded";

/// Number of deposits reported as rejected.
pub const METRIC_NUM_TRANSACTIONS_REJECTED: &str = "num transactions rejected";

/// Value of [`METRIC_CURRENT_STEP`] once a driver has exited.
pub const STEP_STOPPED: &str = "stopped";
