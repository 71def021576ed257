//! Provides utilities to initialize logging for relayer processes.
use std::env;

use tracing::*;
use tracing_subscriber::{
    filter::{Directive, EnvFilter, LevelFilter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer,
};

/// Environment variable name for the service label, which is appended to the
/// whoami string.
pub const SVC_LABEL_ENVVAR: &str = "RELAYER_SVC_LABEL";

/// Directive applied when `RUST_LOG` is not set.
const DEFAULT_DIRECTIVE: &str = "info";

/// Configuration for the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// The whoami string, which is used to identify the service in logs.
    whoami: String,

    /// Filter directive used when `RUST_LOG` is unset, e.g. `relayer_sm=debug`.
    default_directive: Option<String>,
}

impl LoggerConfig {
    /// Creates a new instance with whoami set.
    pub const fn new(whoami: String) -> Self {
        Self {
            whoami,
            default_directive: None,
        }
    }

    /// Creates a new instance with the whoami string set to the provided
    /// string.
    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Sets the filter directive used when `RUST_LOG` is not set.
    pub fn set_default_directive(&mut self, directive: impl Into<String>) {
        self.default_directive = Some(directive.into());
    }

    /// The whoami string of this process.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }

    fn env_filter(&self) -> EnvFilter {
        let directive = self
            .default_directive
            .as_deref()
            .unwrap_or(DEFAULT_DIRECTIVE)
            .parse::<Directive>()
            .unwrap_or_else(|_| LevelFilter::INFO.into());

        EnvFilter::builder()
            .with_default_directive(directive)
            .from_env_lossy()
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(relayer)")
    }
}

/// Initializes the logging subsystem with the provided config.
///
/// Must be called at most once per process.
pub fn init(config: LoggerConfig) {
    let log_file = env::var("LOG_FILE").is_ok_and(|v| v == "1");
    let log_line_num = env::var("LOG_LINE_NUM").is_ok_and(|v| v == "1");

    let stdout_sub = tracing_subscriber::fmt::layer()
        .compact()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(log_file)
                .with_line_number(log_line_num),
        )
        .with_filter(config.env_filter());

    tracing_subscriber::registry().with(stdout_sub).init();

    info!(whoami = %config.whoami, "logging started");
}

/// Gets the service label from the standard envvar, which should be included
/// in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    whoami_with_label(base, get_service_label_from_env().as_deref())
}

fn whoami_with_label(base: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}
