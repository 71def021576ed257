//! Crate includes reusable utils for relayer services.
//! Such as initializing the tracing framework.

pub mod logging;

// Re-export tracing crate for convenience.
pub use tracing;
