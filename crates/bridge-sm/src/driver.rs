//! Runs a [`StepGraph`] one step at a time until cancelled.

use std::{fmt, sync::Arc};

use relayer_status::{
    metrics::{METRIC_CURRENT_STEP, STEP_STOPPED},
    StatusHandler,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    config::StepDriverConfig,
    errors::ConfigError,
    steps::{validate_step_identifiers, Step, StepGraph},
};

/// Drives a step graph, publishing the current step through a status handler.
pub struct StepDriver<G: StepGraph> {
    graph: G,
    config: StepDriverConfig,
    status: Arc<dyn StatusHandler>,
    current: G::Step,
}

impl<G: StepGraph + fmt::Debug> fmt::Debug for StepDriver<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDriver")
            .field("graph", &self.graph)
            .field("config", &self.config)
            .field("status", &self.status.name())
            .field("current", &self.current)
            .finish()
    }
}

impl<G: StepGraph> StepDriver<G> {
    /// Creates a driver positioned on the initial step of `graph`.
    ///
    /// Fails if two steps of the graph share an identifier.
    pub fn new(
        graph: G,
        config: StepDriverConfig,
        status: Arc<dyn StatusHandler>,
    ) -> Result<Self, ConfigError> {
        validate_step_identifiers::<G::Step>()?;

        let current = graph.initial_step();
        status.set_string_metric(METRIC_CURRENT_STEP, current.identifier());

        Ok(Self {
            graph,
            config,
            status,
            current,
        })
    }

    /// The step executed by the next [`tick`](Self::tick).
    pub const fn current_step(&self) -> G::Step {
        self.current
    }

    /// The driven graph.
    pub const fn graph(&self) -> &G {
        &self.graph
    }

    /// Executes the current step and moves to the step it returned.
    pub async fn tick(&mut self) -> G::Step {
        debug!(name = %self.config.name, step = %self.current.identifier(), "executing step");

        let next = self.graph.execute(self.current).await;
        self.current = next;
        self.status
            .set_string_metric(METRIC_CURRENT_STEP, next.identifier());

        next
    }

    /// Ticks once per configured interval until `cancel` fires, then returns the graph.
    pub async fn run(mut self, cancel: CancellationToken) -> G {
        info!(name = %self.config.name, "state machine started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.duration_between_steps) => {
                    self.tick().await;
                }
            }
        }

        self.status
            .set_string_metric(METRIC_CURRENT_STEP, STEP_STOPPED);
        info!(name = %self.config.name, "state machine stopped");

        self.graph
    }
}
