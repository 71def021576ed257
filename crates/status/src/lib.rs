//! Observational status reporting for relayer components.
//!
//! Components publish integer and string metrics through a [`StatusHandler`]; nothing in the
//! relayer reads them back to make decisions.

pub mod errors;
pub mod handler;
pub mod holder;
pub mod metrics;

pub use errors::StatusError;
pub use handler::{RelayerStatus, StatusHandler};
pub use holder::{GeneralMetrics, MetricValue, MetricsHolder};
