use std::time::Duration;

use relayer_sm::config::ExecutorConfig;
use relayer_test_utils::network::NetworkConfig;
use relayer_topology::LeaderSelection;
use serde::{Deserialize, Serialize};

/// The configuration of a dev relayer run.
///
/// All relayers of the run share these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// The number of relayers to run.
    pub num_relayers: usize,

    /// The number of relayer signatures required on both ledgers.
    pub quorum: usize,

    /// The number of quorum polls before a relayer abandons a cycle.
    pub max_quorum_retries: u64,

    /// The pause between two steps of a driver.
    pub duration_between_steps: Duration,

    /// Whether the process exits once every seeded batch is bridged.
    pub exit_when_done: bool,

    /// The number of worker threads of the runtime.
    pub num_threads: Option<u8>,

    /// The configuration of leader election.
    pub topology: TopologyConfig,

    /// The configuration of the executors.
    pub executor: ExecutorConfig,

    /// The deposits seeded on both ledgers at startup.
    pub deposits: DepositsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TopologyConfig {
    /// The length of a leader window, in seconds.
    pub step_duration: u64,

    #[serde(default)]
    pub leader_selection: LeaderSelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DepositsConfig {
    /// Seed of the deposit generator.
    pub seed: u64,

    /// The number of batches seeded on each ledger.
    pub num_batches: u64,

    /// The number of deposits in every batch.
    pub deposits_per_batch: usize,

    /// Zero the amount of the last deposit of every source batch, so that the destination
    /// rejects it.
    #[serde(default)]
    pub reject_last_deposit: bool,
}

impl Config {
    pub(crate) fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            num_relayers: self.num_relayers,
            quorum: self.quorum,
            max_quorum_retries: self.max_quorum_retries,
            leader_step_duration: Duration::from_secs(self.topology.step_duration),
            leader_selection: self.topology.leader_selection,
            duration_between_steps: self.duration_between_steps,
            executor: self.executor.clone(),
        }
    }
}
