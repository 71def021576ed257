use std::{fmt, sync::Arc};

use relayer_primitives::types::{MessageHash, INVALID_ACTION_ID};
use relayer_status::StatusHandler;
use relayer_topology::TopologyProvider;
use tokio_util::sync::CancellationToken;

use super::{retries::RetryCounter, BridgeExecutor};
use crate::{
    clients::{DestinationChainClient, SourceChainClient},
    config::ExecutorConfig,
    errors::ConfigError,
    signatures::SignaturesHolder,
};

/// Assembles a [`BridgeExecutor`], checking that every collaborator is present.
pub struct BridgeExecutorBuilder<S, D, T> {
    source: Option<S>,
    destination: Option<D>,
    topology: Option<T>,
    status: Option<Arc<dyn StatusHandler>>,
    signatures: Option<Arc<SignaturesHolder>>,
    cancel: Option<CancellationToken>,
    config: ExecutorConfig,
}

impl<S, D, T> Default for BridgeExecutorBuilder<S, D, T> {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            topology: None,
            status: None,
            signatures: None,
            cancel: None,
            config: ExecutorConfig::default(),
        }
    }
}

impl<S, D, T> fmt::Debug for BridgeExecutorBuilder<S, D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeExecutorBuilder")
            .field("has_source", &self.source.is_some())
            .field("has_destination", &self.destination.is_some())
            .field("has_topology", &self.topology.is_some())
            .field("has_status", &self.status.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S, D, T> BridgeExecutorBuilder<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    /// Sets the client of the action-based chain.
    pub fn with_source_client(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the client of the signature-based chain.
    pub fn with_destination_client(mut self, destination: D) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Sets the leader election provider.
    pub fn with_topology(mut self, topology: T) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Sets the sink for metrics and the last encountered error.
    pub fn with_status_handler(mut self, status: Arc<dyn StatusHandler>) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the holder of gossiped signatures, shared with the destination client.
    pub fn with_signatures_holder(mut self, signatures: Arc<SignaturesHolder>) -> Self {
        self.signatures = Some(signatures);
        self
    }

    /// Sets the token that aborts blocking calls. A fresh token is used if none is set.
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets the executor settings.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the executor.
    pub fn build(self) -> Result<BridgeExecutor<S, D, T>, ConfigError> {
        let source = self
            .source
            .ok_or(ConfigError::MissingComponent("source client"))?;
        let destination = self
            .destination
            .ok_or(ConfigError::MissingComponent("destination client"))?;
        let topology = self
            .topology
            .ok_or(ConfigError::MissingComponent("topology provider"))?;
        let status = self
            .status
            .ok_or(ConfigError::MissingComponent("status handler"))?;
        let signatures = self
            .signatures
            .ok_or(ConfigError::MissingComponent("signatures holder"))?;

        self.config.validate()?;

        let source_max_retries = source.max_retries_on_quorum_reached();
        if source_max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries("source"));
        }
        let destination_max_retries = destination.max_retries_on_quorum_reached();
        if destination_max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries("destination"));
        }

        Ok(BridgeExecutor {
            source,
            destination,
            topology,
            status,
            signatures,
            cancel: self.cancel.unwrap_or_default(),
            time_for_wait: self.config.time_for_wait,
            batch: None,
            action_id: INVALID_ACTION_ID,
            msg_hash: MessageHash::default(),
            source_retries: RetryCounter::new(source_max_retries),
            destination_retries: RetryCounter::new(destination_max_retries),
        })
    }
}
