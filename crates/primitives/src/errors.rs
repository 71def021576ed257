//! Errors raised while validating or decoding batch data.

use thiserror::Error;

use crate::types::DepositNonce;

/// Errors that can occur while validating a [`TransferBatch`](crate::batch::TransferBatch).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// A deposit does not carry the nonce that follows its predecessor.
    #[error("invalid deposit nonce at index {index}: found {found}, expected {expected}")]
    NonceGap {
        /// Position of the offending deposit in the batch.
        index: usize,
        /// The nonce carried by the offending deposit.
        found: DepositNonce,
        /// The nonce that was expected at this position.
        expected: DepositNonce,
    },

    /// The number of statuses does not match the number of deposits.
    #[error("batch has {deposits} deposits but {statuses} statuses")]
    StatusCountMismatch {
        /// Number of deposits in the batch.
        deposits: usize,
        /// Number of statuses in the batch.
        statuses: usize,
    },

    /// The next expected nonce does not fit in the nonce type.
    #[error("nonce overflow after {0}")]
    NonceOverflow(DepositNonce),
}

/// Errors that can occur while decoding the call data attached to a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallDataError {
    /// The payload does not even contain the protocol marker.
    #[error("call data too short for protocol indicator")]
    MissingMarker,

    /// The payload starts with a marker that is not known.
    #[error("unexpected call data protocol indicator: {0}")]
    UnknownMarker(u8),

    /// The payload ended before the named field could be read.
    #[error("call data too short while extracting {0}")]
    Truncated(&'static str),

    /// The gas limit is encoded on more bytes than a `u64` can hold.
    #[error("gas limit encoded on {0} bytes")]
    GasLimitTooLong(usize),
}

/// The result type for batch validation.
pub type BatchResult<T> = Result<T, BatchError>;
