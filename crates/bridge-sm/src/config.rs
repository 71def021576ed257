//! Configuration of the executor and the step driver.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Smallest accepted confirmation wait.
pub const MIN_TIME_FOR_WAIT: Duration = Duration::from_secs(1);

/// Number of slices the confirmation wait is split into.
///
/// The executor polls the chain after each slice and stops waiting early once the awaited
/// outcome is observed.
pub const WAIT_SPLITS: u32 = 10;

/// Default pause between two consecutive steps.
pub const DEFAULT_DURATION_BETWEEN_STEPS: Duration = Duration::from_secs(12);

/// Default confirmation wait.
pub const DEFAULT_TIME_FOR_WAIT: Duration = Duration::from_secs(60);

/// Settings of a [`BridgeExecutor`](crate::executor::BridgeExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Upper bound on the time spent waiting for a submitted transaction to be observed as
    /// executed, and for final statuses to become available.
    ///
    /// Must be at least [`MIN_TIME_FOR_WAIT`].
    pub time_for_wait: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            time_for_wait: DEFAULT_TIME_FOR_WAIT,
        }
    }
}

impl ExecutorConfig {
    /// Checks the bounds of every setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_for_wait < MIN_TIME_FOR_WAIT {
            return Err(ConfigError::InvalidDuration {
                name: "time for wait",
                value: self.time_for_wait,
                minimum: MIN_TIME_FOR_WAIT,
            });
        }

        Ok(())
    }
}

/// Settings of a [`StepDriver`](crate::driver::StepDriver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDriverConfig {
    /// Name used in logs to tell the drivers of a process apart.
    pub name: String,

    /// Pause between two consecutive steps.
    pub duration_between_steps: Duration,
}

impl StepDriverConfig {
    /// Creates a config with the default pause between steps.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration_between_steps: DEFAULT_DURATION_BETWEEN_STEPS,
        }
    }

    /// Updates the pause between steps and returns the updated config.
    pub const fn with_duration_between_steps(mut self, duration: Duration) -> Self {
        self.duration_between_steps = duration;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_config_bounds() {
        assert!(ExecutorConfig::default().validate().is_ok());

        let config = ExecutorConfig {
            time_for_wait: Duration::from_millis(999),
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                name: "time for wait",
                value: Duration::from_millis(999),
                minimum: MIN_TIME_FOR_WAIT,
            })
        );
    }

    #[test]
    fn test_config_serde_toml() {
        let config = r#"
            name = "source-to-destination"
            duration_between_steps = { secs = 12, nanos = 0 }
        "#;

        let config = toml::from_str::<StepDriverConfig>(config);
        assert!(
            config.is_ok(),
            "must be able to deserialize config from toml but got: {}",
            config.unwrap_err()
        );

        let config = config.unwrap();
        assert_eq!(config, StepDriverConfig::new("source-to-destination"));

        let serialized = toml::to_string(&config).unwrap();
        let deserialized = toml::from_str::<StepDriverConfig>(&serialized).unwrap();
        assert_eq!(
            deserialized, config,
            "must be able to serialize and deserialize config to toml"
        );
    }
}
