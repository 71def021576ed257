//! Status handlers.

use std::{collections::BTreeMap, fmt};

use parking_lot::RwLock;

use crate::errors::StatusError;

/// Sink for string and integer metrics.
///
/// Implementations must tolerate concurrent readers while a driver writes.
pub trait StatusHandler: Send + Sync + fmt::Debug {
    /// The name under which this handler is registered.
    fn name(&self) -> &str;

    /// Sets an integer metric.
    fn set_int_metric(&self, metric: &str, value: i64);

    /// Adds `delta` to an integer metric, starting from zero if it was never set.
    fn add_int_metric(&self, metric: &str, delta: i64);

    /// Sets a string metric.
    fn set_string_metric(&self, metric: &str, value: &str);

    /// Returns a snapshot of every integer metric.
    fn int_metrics(&self) -> BTreeMap<String, i64>;

    /// Returns a snapshot of every string metric.
    fn string_metrics(&self) -> BTreeMap<String, String>;
}

/// In-memory [`StatusHandler`].
#[derive(Debug)]
pub struct RelayerStatus {
    name: String,
    int_metrics: RwLock<BTreeMap<String, i64>>,
    string_metrics: RwLock<BTreeMap<String, String>>,
}

impl RelayerStatus {
    /// Creates an empty handler.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::EmptyName`] if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, StatusError> {
        let name = name.into();
        if name.is_empty() {
            return Err(StatusError::EmptyName);
        }

        Ok(Self {
            name,
            int_metrics: RwLock::new(BTreeMap::new()),
            string_metrics: RwLock::new(BTreeMap::new()),
        })
    }
}

impl StatusHandler for RelayerStatus {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_int_metric(&self, metric: &str, value: i64) {
        self.int_metrics.write().insert(metric.to_string(), value);
    }

    fn add_int_metric(&self, metric: &str, delta: i64) {
        *self
            .int_metrics
            .write()
            .entry(metric.to_string())
            .or_default() += delta;
    }

    fn set_string_metric(&self, metric: &str, value: &str) {
        self.string_metrics
            .write()
            .insert(metric.to_string(), value.to_string());
    }

    fn int_metrics(&self) -> BTreeMap<String, i64> {
        self.int_metrics.read().clone()
    }

    fn string_metrics(&self) -> BTreeMap<String, String> {
        self.string_metrics.read().clone()
    }
}
