//! Errors related to status handlers.

use thiserror::Error;

/// Errors that can occur while creating or registering status handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// A status handler was created without a name.
    #[error("empty status handler name")]
    EmptyName,

    /// A status handler with the same name is already registered.
    #[error("status handler {0} already registered")]
    DuplicateHandler(String),

    /// No status handler with this name is registered.
    #[error("unknown status handler {0}")]
    UnknownHandler(String),
}
