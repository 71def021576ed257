//! Errors raised while building a topology handler.

use thiserror::Error;

/// Construction errors for [`TopologyHandler`](crate::handler::TopologyHandler).
///
/// All of these are fatal: the relayer cannot take part in leader election until its
/// configuration is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// No provider for the sorted key list was supplied.
    #[error("missing sorted public keys provider")]
    MissingKeyProvider,

    /// No clock was supplied.
    #[error("missing timer")]
    MissingTimer,

    /// The step duration is shorter than one second.
    #[error("invalid step duration: {0:?}")]
    InvalidStepDuration(std::time::Duration),

    /// The relayer's own address is empty.
    #[error("empty relayer address")]
    EmptyAddress,
}
