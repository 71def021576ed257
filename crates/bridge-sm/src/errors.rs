//! Errors raised by the bridge executor and the step machinery.

use std::time::Duration;

use relayer_primitives::{errors::BatchError, types::BatchId};
use relayer_status::StatusError;
use relayer_topology::TopologyError;
use thiserror::Error;

use crate::clients::ClientError;

/// Errors returned by executor operations.
///
/// None of these are fatal: a step that receives one logs it and restarts the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The operation needs a stored batch but none is stored.
    #[error("nil batch")]
    NilBatch,

    /// The chain returned the invalid action id for the stored batch.
    #[error("invalid action id for batch {0}")]
    InvalidActionId(BatchId),

    /// The batch fetched by nonce is not the requested one or is empty.
    #[error(
        "batch not found, requested nonce: {requested}, fetched nonce: {fetched}, num deposits: {num_deposits}"
    )]
    BatchNotFound {
        /// The requested batch id.
        requested: BatchId,
        /// The id of the batch the chain returned.
        fetched: BatchId,
        /// The number of deposits of the returned batch.
        num_deposits: usize,
    },

    /// The stored batch failed validation.
    #[error("invalid batch: {0}")]
    Batch(#[from] BatchError),

    /// A chain client call failed.
    #[error("client: {0}")]
    Client(#[from] ClientError),

    /// The operation was aborted because the relayer is shutting down.
    #[error("operation cancelled")]
    Cancelled,
}

/// The result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors raised while assembling an executor, a step graph or a driver.
///
/// These are fatal and are only produced at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A mandatory collaborator was not supplied.
    #[error("missing component: {0}")]
    MissingComponent(&'static str),

    /// A duration is below its lower bound.
    #[error("invalid {name}: {value:?}, minimum {minimum:?}")]
    InvalidDuration {
        /// The name of the offending setting.
        name: &'static str,
        /// The configured value.
        value: Duration,
        /// The smallest accepted value.
        minimum: Duration,
    },

    /// A retry budget is zero.
    #[error("invalid max quorum retries on {0}: must be at least 1")]
    InvalidMaxRetries(&'static str),

    /// Two steps of a graph share the same identifier.
    #[error("duplicated step identifier used in multiple steps: {0}")]
    DuplicatedStepIdentifier(&'static str),

    /// The topology handler could not be built.
    #[error("topology: {0}")]
    Topology(#[from] TopologyError),

    /// The status handler could not be built.
    #[error("status: {0}")]
    Status(#[from] StatusError),
}
