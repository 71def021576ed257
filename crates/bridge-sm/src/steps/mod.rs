//! Step graphs of the two bridge directions.
//!
//! A step graph is a closed set of named steps. Executing a step performs its side effects
//! through an executor and yields the next step. Steps never fail: every error is reported and
//! turned into a transition, usually back to the initial step of the graph.

mod destination_to_source;
mod source_to_destination;

use std::{collections::HashSet, fmt, future::Future};

pub use destination_to_source::{DestinationToSource, DestinationToSourceStep};
pub use source_to_destination::{SourceToDestination, SourceToDestinationStep};
use tracing::{debug, error};

use crate::{
    errors::{ConfigError, ExecutorError},
    executor::capabilities::HealthReporter,
};

/// A step of a [`StepGraph`].
pub trait Step: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every step of the graph.
    const ALL: &'static [Self];

    /// The unique, human-readable name of the step.
    fn identifier(&self) -> &'static str;
}

/// A closed set of steps driven one at a time.
pub trait StepGraph: Send {
    /// The steps of this graph.
    type Step: Step;

    /// The step every cycle starts from.
    fn initial_step(&self) -> Self::Step;

    /// Executes `step` and returns the step to run next.
    fn execute(&mut self, step: Self::Step) -> impl Future<Output = Self::Step> + Send;
}

/// Checks that the identifiers of `S` are non-empty and pairwise distinct.
pub fn validate_step_identifiers<S: Step>() -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(S::ALL.len());

    for step in S::ALL {
        let identifier = step.identifier();
        if identifier.is_empty() || !seen.insert(identifier) {
            return Err(ConfigError::DuplicatedStepIdentifier(identifier));
        }
    }

    Ok(())
}

/// Logs an executor failure and mirrors it to the last-error metric.
///
/// Cancellations only happen during shutdown and are not reported as errors.
fn report<E: HealthReporter>(
    executor: &E,
    step: &'static str,
    message: &str,
    err: &ExecutorError,
) {
    if matches!(err, ExecutorError::Cancelled) {
        debug!(%step, "{message}: cancelled");
        return;
    }

    error!(%step, %err, "{message}");
    executor.set_last_error(&format!("{step}: {message}: {err}"));
}
