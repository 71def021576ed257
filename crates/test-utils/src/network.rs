//! A set of relayers wired to shared simulated ledgers.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use relayer_sm::{
    config::{ExecutorConfig, StepDriverConfig},
    driver::StepDriver,
    errors::ConfigError,
    executor::BridgeExecutor,
    signatures::SignaturesHolder,
    steps::{DestinationToSource, SourceToDestination},
};
use relayer_status::RelayerStatus;
use relayer_topology::{LeaderSelection, StaticKeysProvider, Timer, TopologyHandler};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    clients::{Gossip, SimulatedDestinationClient, SimulatedSourceClient, StaticTokenMapper},
    fixtures::{relayer_keys, token_mapper},
    ledger::{DestinationLedger, SourceLedger},
};

/// Executor of a simulated relayer.
pub type SimulatedExecutor =
    BridgeExecutor<SimulatedSourceClient, SimulatedDestinationClient, TopologyHandler>;

/// Settings shared by every relayer of a [`SimulatedNetwork`].
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Number of relayers.
    pub num_relayers: usize,
    /// Signatures (or signers) required on both chains.
    pub quorum: usize,
    /// Quorum polls allowed before a cycle is abandoned.
    pub max_quorum_retries: u64,
    /// Length of a leader window.
    pub leader_step_duration: Duration,
    /// How leaders are picked.
    pub leader_selection: LeaderSelection,
    /// Pause between two steps.
    pub duration_between_steps: Duration,
    /// Executor settings.
    pub executor: ExecutorConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            num_relayers: 3,
            quorum: 2,
            max_quorum_retries: 10,
            leader_step_duration: Duration::from_secs(6),
            leader_selection: LeaderSelection::RoundRobin,
            duration_between_steps: Duration::from_secs(1),
            executor: ExecutorConfig {
                time_for_wait: Duration::from_secs(1),
            },
        }
    }
}

/// The two ledgers plus the gossip layer relayers share.
#[derive(Debug)]
pub struct SimulatedNetwork {
    config: NetworkConfig,
    keys: Vec<Vec<u8>>,
    source: Arc<SourceLedger>,
    destination: Arc<DestinationLedger>,
    gossip: Arc<Gossip>,
    tokens: StaticTokenMapper,
}

impl SimulatedNetwork {
    /// Creates empty ledgers governed by `config.num_relayers` relayers.
    pub fn new(config: NetworkConfig) -> Self {
        let keys = relayer_keys(config.num_relayers);

        Self {
            source: Arc::new(SourceLedger::new(keys.clone(), config.quorum)),
            destination: Arc::new(DestinationLedger::new(keys.clone(), config.quorum)),
            gossip: Arc::new(Gossip::new()),
            tokens: token_mapper(),
            keys,
            config,
        }
    }

    /// The action-based ledger.
    pub const fn source(&self) -> &Arc<SourceLedger> {
        &self.source
    }

    /// The signature-based ledger.
    pub const fn destination(&self) -> &Arc<DestinationLedger> {
        &self.destination
    }

    /// Public keys of the relayers.
    pub fn keys(&self) -> &[Vec<u8>] {
        &self.keys
    }

    fn topology(&self, key: &[u8], timer: Arc<dyn Timer>) -> Result<TopologyHandler, ConfigError> {
        let handler = TopologyHandler::builder()
            .with_key_provider(Arc::new(StaticKeysProvider::new(self.keys.clone())))
            .with_timer(timer)
            .with_step_duration(self.config.leader_step_duration)
            .with_address(key.to_vec())
            .with_selection(self.config.leader_selection)
            .build()?;

        Ok(handler)
    }

    fn executor(
        &self,
        key: &[u8],
        timer: Arc<dyn Timer>,
        signatures: Arc<SignaturesHolder>,
        status: Arc<RelayerStatus>,
        cancel: CancellationToken,
    ) -> Result<SimulatedExecutor, ConfigError> {
        let source = SimulatedSourceClient::new(
            self.source.clone(),
            key.to_vec(),
            self.tokens.clone(),
            self.config.max_quorum_retries,
        );
        let destination = SimulatedDestinationClient::new(
            self.destination.clone(),
            key.to_vec(),
            signatures.clone(),
            self.gossip.clone(),
            self.tokens.reversed(),
            self.config.max_quorum_retries,
        );

        SimulatedExecutor::builder()
            .with_source_client(source)
            .with_destination_client(destination)
            .with_topology(self.topology(key, timer)?)
            .with_status_handler(status)
            .with_signatures_holder(signatures)
            .with_cancellation_token(cancel)
            .with_config(self.config.executor.clone())
            .build()
    }

    /// Assembles relayer number `index`, with one driver per direction.
    pub fn relayer(
        &self,
        index: usize,
        timer: Arc<dyn Timer>,
        cancel: CancellationToken,
    ) -> Result<SimulatedRelayer, ConfigError> {
        let key = self
            .keys
            .get(index)
            .ok_or(ConfigError::MissingComponent("relayer key"))?;
        let name = String::from_utf8_lossy(key).into_owned();

        let signatures = Arc::new(SignaturesHolder::new());
        self.gossip.subscribe(signatures.clone());

        let s2d_status = Arc::new(RelayerStatus::new(format!("{name} source-to-destination"))?);
        let d2s_status = Arc::new(RelayerStatus::new(format!("{name} destination-to-source"))?);

        let s2d_executor = self.executor(
            key,
            timer.clone(),
            signatures.clone(),
            s2d_status.clone(),
            cancel.clone(),
        )?;
        let d2s_executor = self.executor(key, timer, signatures, d2s_status.clone(), cancel)?;

        let source_to_destination = StepDriver::new(
            SourceToDestination::new(s2d_executor),
            StepDriverConfig::new(format!("{name} source-to-destination"))
                .with_duration_between_steps(self.config.duration_between_steps),
            s2d_status.clone(),
        )?;
        let destination_to_source = StepDriver::new(
            DestinationToSource::new(d2s_executor),
            StepDriverConfig::new(format!("{name} destination-to-source"))
                .with_duration_between_steps(self.config.duration_between_steps),
            d2s_status.clone(),
        )?;

        Ok(SimulatedRelayer {
            name,
            statuses: [s2d_status, d2s_status],
            source_to_destination,
            destination_to_source,
        })
    }
}

/// One relayer: a driver per direction and their status handlers.
#[derive(Debug)]
pub struct SimulatedRelayer {
    /// Human-readable relayer name.
    pub name: String,
    /// Status handlers of the source-to-destination and destination-to-source drivers.
    pub statuses: [Arc<RelayerStatus>; 2],
    /// Driver of the source-to-destination direction.
    pub source_to_destination: StepDriver<SourceToDestination<SimulatedExecutor>>,
    /// Driver of the destination-to-source direction.
    pub destination_to_source: StepDriver<DestinationToSource<SimulatedExecutor>>,
}

impl SimulatedRelayer {
    /// Runs both drivers until `cancel` fires, then closes the source clients.
    pub async fn run(self, cancel: CancellationToken) {
        let (s2d, d2s) = futures::join!(
            self.source_to_destination.run(cancel.clone()),
            self.destination_to_source.run(cancel),
        );

        for result in [s2d.executor().close().await, d2s.executor().close().await] {
            if let Err(err) = result {
                info!(name = %self.name, %err, "error closing client");
            }
        }
    }
}

/// Runs every relayer until `cancel` fires.
pub async fn run_relayers(relayers: Vec<SimulatedRelayer>, cancel: CancellationToken) {
    join_all(relayers.into_iter().map(|relayer| relayer.run(cancel.clone()))).await;
}
