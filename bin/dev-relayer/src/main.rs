//! Runs a set of bridge relayers in one process against simulated ledgers.
//!
//! Both ledgers are seeded with random deposits at startup; the relayers bridge them in both
//! directions until interrupted, and the metrics of every driver are logged on exit.

use std::{fs, path::Path, sync::Arc};

use anyhow::Context;
use clap::Parser;
use config::Config;
use constants::{DEFAULT_THREAD_COUNT, FIRST_DEPOSIT_NONCE, PROGRESS_INTERVAL};
use rand::{rngs::StdRng, SeedableRng};
use relayer_common::{logging, logging::LoggerConfig};
use relayer_primitives::{batch::TransferBatch, types::BatchId};
use relayer_status::MetricsHolder;
use relayer_test_utils::{
    fixtures::{random_deposits, DESTINATION_TOKENS, SOURCE_TOKENS},
    ledger::SourceLedger,
    network::{run_relayers, SimulatedNetwork},
};
use relayer_topology::{SystemTimer, Timer};
use serde::de::DeserializeOwned;
use tokio::{runtime, signal, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

mod args;
mod config;
mod constants;

fn main() -> anyhow::Result<()> {
    logging::init(LoggerConfig::with_base_name("dev-relayer"));

    let cli = args::Cli::parse();
    let config = parse_toml::<Config>(&cli.config)?;
    info!(num_relayers = %config.num_relayers, quorum = %config.quorum, "starting dev relayer");

    let runtime = runtime::Builder::new_multi_thread()
        .worker_threads(config.num_threads.unwrap_or(DEFAULT_THREAD_COUNT).into())
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    runtime.block_on(run(config))?;

    info!("dev relayer shutdown complete");
    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    let network = SimulatedNetwork::new(config.network_config());
    seed_deposits(&network, &config);

    let cancel = CancellationToken::new();
    let timer: Arc<dyn Timer> = Arc::new(SystemTimer);
    let relayers = (0..config.num_relayers)
        .map(|index| network.relayer(index, timer.clone(), cancel.clone()))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to assemble relayers")?;

    let metrics = MetricsHolder::new();
    for status in relayers.iter().flat_map(|relayer| relayer.statuses.iter()) {
        metrics.add_status_handler(status.clone())?;
    }

    tokio::spawn(listen_for_shutdown(cancel.clone()));
    tokio::spawn(report_progress(
        network.source().clone(),
        config.deposits.num_batches,
        config.exit_when_done,
        cancel.clone(),
    ));

    run_relayers(relayers, cancel).await;

    for name in metrics.available_status_handlers() {
        let all = metrics.all_metrics(&name)?;
        info!(%name, metrics = %serde_json::to_string(&all)?, "final metrics");
    }

    Ok(())
}

fn seed_deposits(network: &SimulatedNetwork, config: &Config) {
    let mut rng = StdRng::seed_from_u64(config.deposits.seed);
    let per_batch = config.deposits.deposits_per_batch;

    let mut source_nonce = FIRST_DEPOSIT_NONCE;
    let mut destination_nonce = FIRST_DEPOSIT_NONCE;
    for batch_id in 1..=config.deposits.num_batches {
        let mut deposits = random_deposits(&mut rng, source_nonce, per_batch, &SOURCE_TOKENS);
        if config.deposits.reject_last_deposit {
            if let Some(last) = deposits.last_mut() {
                last.amount = Default::default();
            }
        }
        network
            .source()
            .deposit_batch(TransferBatch::new(batch_id, deposits));

        network.destination().deposit(random_deposits(
            &mut rng,
            destination_nonce,
            per_batch,
            &DESTINATION_TOKENS,
        ));

        source_nonce += per_batch as u64;
        destination_nonce += per_batch as u64;
    }

    info!(num_batches = %config.deposits.num_batches, %per_batch, "seeded both ledgers");
}

async fn listen_for_shutdown(cancel: CancellationToken) {
    if let Err(err) = signal::ctrl_c().await {
        error!(%err, "failed to listen for the shutdown signal");
        return;
    }

    info!("shutdown signal received");
    cancel.cancel();
}

async fn report_progress(
    source: Arc<SourceLedger>,
    num_batches: BatchId,
    exit_when_done: bool,
    cancel: CancellationToken,
) {
    let mut interval = time::interval(PROGRESS_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {}
        }

        let pending = source.num_pending_batches();
        let executed = source.last_executed_batch_id();
        debug!(%pending, %executed, "progress");

        if pending == 0 && executed >= num_batches {
            info!(%num_batches, "every seeded batch was bridged");
            if exit_when_done {
                cancel.cancel();
            }
            return;
        }
    }
}

/// Reads and parses a TOML file from the given path into the given type `T`.
fn parse_toml<T>(path: impl AsRef<Path>) -> anyhow::Result<T>
where
    T: std::fmt::Debug + DeserializeOwned,
{
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read TOML file {}", path.display()))?;
    trace!(?contents, "read file");

    let parsed = toml::from_str::<T>(&contents).context("failed to parse TOML file")?;
    debug!(?parsed, "parsed TOML file");

    Ok(parsed)
}
