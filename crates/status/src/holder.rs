//! Registry of the status handlers of a process.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{errors::StatusError, handler::StatusHandler};

/// Every metric of a single handler, merged into one map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralMetrics(pub BTreeMap<String, MetricValue>);

/// Value of a metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// An integer metric.
    Int(i64),
    /// A string metric.
    Str(String),
}

/// Collects the status handlers of a process by name.
#[derive(Debug, Default)]
pub struct MetricsHolder {
    handlers: RwLock<BTreeMap<String, Arc<dyn StatusHandler>>>,
}

impl MetricsHolder {
    /// Creates an empty holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its own name.
    pub fn add_status_handler(&self, handler: Arc<dyn StatusHandler>) -> Result<(), StatusError> {
        let mut handlers = self.handlers.write();
        let name = handler.name().to_string();
        if handlers.contains_key(&name) {
            return Err(StatusError::DuplicateHandler(name));
        }

        handlers.insert(name, handler);

        Ok(())
    }

    /// Returns the sorted names of the registered handlers.
    pub fn available_status_handlers(&self) -> Vec<String> {
        self.handlers.read().keys().cloned().collect()
    }

    /// Returns every metric of the named handler.
    pub fn all_metrics(&self, name: &str) -> Result<GeneralMetrics, StatusError> {
        let handlers = self.handlers.read();
        let handler = handlers
            .get(name)
            .ok_or_else(|| StatusError::UnknownHandler(name.to_string()))?;

        let mut metrics: BTreeMap<String, MetricValue> = handler
            .int_metrics()
            .into_iter()
            .map(|(k, v)| (k, MetricValue::Int(v)))
            .collect();
        metrics.extend(
            handler
                .string_metrics()
                .into_iter()
                .map(|(k, v)| (k, MetricValue::Str(v))),
        );

        Ok(GeneralMetrics(metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        handler::RelayerStatus,
        metrics::{METRIC_CURRENT_STEP, METRIC_NUM_BATCHES},
    };

    #[test]
    fn test_register_and_query() {
        let holder = MetricsHolder::new();
        let status = Arc::new(RelayerStatus::new("source-to-destination").unwrap());
        status.set_int_metric(METRIC_NUM_BATCHES, 4);
        status.set_string_metric(METRIC_CURRENT_STEP, "get pending batch");

        holder.add_status_handler(status.clone()).unwrap();
        holder
            .add_status_handler(Arc::new(RelayerStatus::new("another").unwrap()))
            .unwrap();

        assert_eq!(
            holder.available_status_handlers(),
            vec!["another".to_string(), "source-to-destination".to_string()]
        );

        let metrics = holder.all_metrics("source-to-destination").unwrap();
        assert_eq!(metrics.0[METRIC_NUM_BATCHES], MetricValue::Int(4));
        assert_eq!(
            metrics.0[METRIC_CURRENT_STEP],
            MetricValue::Str("get pending batch".to_string())
        );

        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains(r#""num batches":4"#));
    }

    #[test]
    fn test_duplicate_and_unknown_handlers() {
        let holder = MetricsHolder::new();
        holder
            .add_status_handler(Arc::new(RelayerStatus::new("a").unwrap()))
            .unwrap();

        assert_eq!(
            holder.add_status_handler(Arc::new(RelayerStatus::new("a").unwrap())),
            Err(StatusError::DuplicateHandler("a".to_string()))
        );
        assert_eq!(
            holder.all_metrics("b"),
            Err(StatusError::UnknownHandler("b".to_string()))
        );
    }
}
