//! The side-effecting boundary used by every step.
//!
//! [`BridgeExecutor`] holds the state of the cycle in progress (batch, action id, message hash,
//! quorum retry counters) and turns each capability of [`capabilities`] into chain client calls.
//! Mutating operations always re-derive their inputs from the stored state, so a step can be
//! retried without re-fetching anything.

mod builder;
pub mod capabilities;
pub mod retries;

use std::{fmt, future::Future, sync::Arc, time::Duration};

pub use builder::BridgeExecutorBuilder;
use capabilities::{
    ActionProposer, BatchFetcher, BatchStore, Chain, ConfirmationWaiter, HealthReporter,
    LeaderElection, QuorumRetries, StatusResolver, TransferSigner,
};
use relayer_primitives::{
    batch::TransferBatch,
    status::DepositStatus,
    types::{ActionId, BatchId, MessageHash, INVALID_ACTION_ID},
};
use relayer_status::{
    metrics::{
        METRIC_LAST_ERROR, METRIC_NUM_BATCHES, METRIC_NUM_TRANSACTIONS_REJECTED,
        METRIC_NUM_TRANSACTIONS_SUCCEEDED,
    },
    StatusHandler,
};
use relayer_topology::TopologyProvider;
use retries::RetryCounter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    clients::{ClientResult, DestinationChainClient, SourceChainClient},
    config::WAIT_SPLITS,
    errors::{ExecutorError, ExecutorResult},
    signatures::SignaturesHolder,
};

/// Executor backed by real chain clients.
pub struct BridgeExecutor<S, D, T> {
    source: S,
    destination: D,
    topology: T,
    status: Arc<dyn StatusHandler>,
    signatures: Arc<SignaturesHolder>,
    cancel: CancellationToken,
    time_for_wait: Duration,

    batch: Option<TransferBatch>,
    action_id: ActionId,
    msg_hash: MessageHash,
    source_retries: RetryCounter,
    destination_retries: RetryCounter,
}

impl<S, D, T> fmt::Debug for BridgeExecutor<S, D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeExecutor")
            .field("batch_id", &self.batch.as_ref().map(TransferBatch::id))
            .field("action_id", &self.action_id)
            .field("msg_hash", &self.msg_hash)
            .field("source_retries", &self.source_retries)
            .field("destination_retries", &self.destination_retries)
            .finish_non_exhaustive()
    }
}

impl<S, D, T> BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    /// Returns a builder for a [`BridgeExecutor`].
    pub fn builder() -> BridgeExecutorBuilder<S, D, T> {
        BridgeExecutorBuilder::default()
    }

    /// The retry counter of `chain`.
    pub const fn quorum_retries(&self, chain: Chain) -> RetryCounter {
        match chain {
            Chain::Source => self.source_retries,
            Chain::Destination => self.destination_retries,
        }
    }

    /// The message hash signed for the stored batch.
    pub const fn stored_message_hash(&self) -> MessageHash {
        self.msg_hash
    }

    /// The token that aborts every blocking call of this executor.
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Closes the source chain client.
    pub async fn close(&self) -> ExecutorResult<()> {
        self.source.close().await.map_err(ExecutorError::from)
    }

    fn batch(&self) -> ExecutorResult<&TransferBatch> {
        self.batch.as_ref().ok_or(ExecutorError::NilBatch)
    }

    /// Sleeps for one slice of the configured wait; returns `false` if cancelled meanwhile.
    async fn wait_slice(&self) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("closing due to cancellation");
                false
            }
            _ = tokio::time::sleep(self.time_for_wait / WAIT_SPLITS) => true,
        }
    }
}

/// Races a client call against the cancellation token.
async fn with_cancel<V, F>(cancel: &CancellationToken, call: F) -> ExecutorResult<V>
where
    F: Future<Output = ClientResult<V>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExecutorError::Cancelled),
        res = call => res.map_err(ExecutorError::from),
    }
}

fn metric_value(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl<S, D, T> BatchStore for BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    fn stored_batch(&self) -> Option<&TransferBatch> {
        self.batch.as_ref()
    }

    fn store_batch(&mut self, batch: TransferBatch) {
        self.batch = Some(batch);
    }

    fn stored_action_id(&self) -> ActionId {
        self.action_id
    }

    fn set_stored_batch_statuses(&mut self, statuses: Vec<u8>) -> ExecutorResult<()> {
        self.batch
            .as_mut()
            .ok_or(ExecutorError::NilBatch)?
            .set_statuses(statuses);

        Ok(())
    }

    fn clear_cycle_state(&mut self) {
        self.batch = None;
        self.action_id = INVALID_ACTION_ID;
        self.msg_hash = MessageHash::default();
    }
}

impl<S, D, T> LeaderElection for BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    fn my_turn_as_leader(&self) -> bool {
        self.topology.my_turn_as_leader()
    }
}

impl<S, D, T> BatchFetcher for BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    async fn get_batch_from_source(&mut self) -> ExecutorResult<Option<TransferBatch>> {
        let batch = with_cancel(&self.cancel, self.source.get_pending_batch()).await?;

        if let Some(batch) = &batch {
            self.status.set_int_metric(
                METRIC_NUM_BATCHES,
                metric_value(batch.id().saturating_sub(1)),
            );
        }

        Ok(batch)
    }

    async fn get_last_executed_batch_id_from_source(&mut self) -> ExecutorResult<BatchId> {
        let batch_id =
            with_cancel(&self.cancel, self.source.get_last_executed_batch_id()).await?;

        self.status
            .set_int_metric(METRIC_NUM_BATCHES, metric_value(batch_id));

        Ok(batch_id)
    }

    async fn get_and_store_batch_from_destination(&mut self, nonce: BatchId) -> ExecutorResult<()> {
        let batch = with_cancel(&self.cancel, self.destination.get_batch(nonce)).await?;

        match batch {
            Some(batch) if batch.id() == nonce && !batch.deposits().is_empty() => {
                self.batch = Some(batch);
                Ok(())
            }
            Some(batch) => Err(ExecutorError::BatchNotFound {
                requested: nonce,
                fetched: batch.id(),
                num_deposits: batch.deposits().len(),
            }),
            None => Err(ExecutorError::BatchNotFound {
                requested: nonce,
                fetched: 0,
                num_deposits: 0,
            }),
        }
    }

    async fn verify_last_deposit_nonce_executed_on_source(&mut self) -> ExecutorResult<()> {
        let batch = self.batch()?;
        let last_nonce =
            with_cancel(&self.cancel, self.source.get_last_executed_deposit_nonce()).await?;

        batch.verify_deposit_nonces(last_nonce)?;

        Ok(())
    }
}

impl<S, D, T> ActionProposer for BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    async fn get_and_store_action_id_for_propose_transfer(&mut self) -> ExecutorResult<ActionId> {
        let batch = self.batch()?;
        let batch_id = batch.id();
        let action_id = with_cancel(
            &self.cancel,
            self.source.get_action_id_for_propose_transfer(batch),
        )
        .await?;

        self.action_id = action_id;
        info!(%batch_id, %action_id, "fetched action ID for propose transfer");

        Ok(action_id)
    }

    async fn get_and_store_action_id_for_propose_set_status(&mut self) -> ExecutorResult<ActionId> {
        let batch = self.batch()?;
        let batch_id = batch.id();
        let action_id =
            with_cancel(&self.cancel, self.source.get_action_id_for_set_status(batch)).await?;

        self.action_id = action_id;
        info!(%batch_id, %action_id, "fetched action ID for set status");

        Ok(action_id)
    }

    async fn was_transfer_proposed_on_source(&mut self) -> ExecutorResult<bool> {
        let batch = self.batch()?;

        with_cancel(&self.cancel, self.source.was_transfer_proposed(batch)).await
    }

    async fn propose_transfer_on_source(&mut self) -> ExecutorResult<()> {
        let batch = self.batch()?;
        let hash = with_cancel(&self.cancel, self.source.propose_transfer(batch)).await?;

        info!(%hash, batch_id = %batch.id(), "proposed transfer");

        Ok(())
    }

    async fn was_set_status_proposed_on_source(&mut self) -> ExecutorResult<bool> {
        let batch = self.batch()?;

        with_cancel(&self.cancel, self.source.was_set_status_proposed(batch)).await
    }

    async fn propose_set_status_on_source(&mut self) -> ExecutorResult<()> {
        let batch = self.batch()?;
        let hash = with_cancel(&self.cancel, self.source.propose_set_status(batch)).await?;

        info!(
            %hash,
            batch_id = %batch.id(),
            statuses = %hex::encode(batch.statuses()),
            "proposed set status"
        );

        Ok(())
    }

    async fn was_action_signed_on_source(&mut self) -> ExecutorResult<bool> {
        with_cancel(&self.cancel, self.source.was_signed(self.action_id)).await
    }

    async fn sign_action_on_source(&mut self) -> ExecutorResult<()> {
        let batch_id = self.batch()?.id();
        if self.action_id == INVALID_ACTION_ID {
            return Err(ExecutorError::InvalidActionId(batch_id));
        }

        let hash = with_cancel(&self.cancel, self.source.sign(self.action_id)).await?;
        info!(%hash, %batch_id, action_id = %self.action_id, "signed action");

        Ok(())
    }

    async fn process_quorum_reached_on_source(&mut self) -> ExecutorResult<bool> {
        with_cancel(&self.cancel, self.source.quorum_reached(self.action_id)).await
    }

    async fn was_action_performed_on_source(&mut self) -> ExecutorResult<bool> {
        with_cancel(&self.cancel, self.source.was_executed(self.action_id)).await
    }

    async fn perform_action_on_source(&mut self) -> ExecutorResult<()> {
        let batch = self.batch()?;
        if self.action_id == INVALID_ACTION_ID {
            return Err(ExecutorError::InvalidActionId(batch.id()));
        }

        let hash =
            with_cancel(&self.cancel, self.source.perform_action(self.action_id, batch)).await?;
        info!(
            %hash,
            batch_id = %batch.id(),
            action_id = %self.action_id,
            "sent perform action transaction"
        );

        Ok(())
    }
}

impl<S, D, T> TransferSigner for BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    async fn was_transfer_performed_on_destination(&mut self) -> ExecutorResult<bool> {
        let batch_id = self.batch()?.id();

        with_cancel(&self.cancel, self.destination.was_executed(batch_id)).await
    }

    fn sign_transfer_on_destination(&mut self) -> ExecutorResult<()> {
        let batch = self.batch()?;
        let batch_id = batch.id();
        let hash = self.destination.generate_message_hash(batch)?;

        info!(%hash, %batch_id, "generated message hash on destination");

        self.msg_hash = hash;
        self.destination.broadcast_signature_for_message_hash(hash);

        Ok(())
    }

    async fn process_quorum_reached_on_destination(&mut self) -> ExecutorResult<bool> {
        with_cancel(&self.cancel, self.destination.is_quorum_reached(self.msg_hash)).await
    }

    async fn perform_transfer_on_destination(&mut self) -> ExecutorResult<()> {
        let batch = self.batch()?;
        let quorum = with_cancel(&self.cancel, self.destination.get_quorum_size()).await?;
        debug!(%quorum, "fetched quorum size");

        info!(%batch, "executing transfer");
        let hash = with_cancel(
            &self.cancel,
            self.destination
                .execute_transfer(self.msg_hash, batch, quorum),
        )
        .await?;

        info!(%hash, batch_id = %batch.id(), "sent execute transfer");

        Ok(())
    }
}

impl<S, D, T> ConfirmationWaiter for BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    async fn wait_for_transfer_confirmation_on_destination(&mut self) {
        for _ in 0..WAIT_SPLITS {
            if !self.wait_slice().await {
                return;
            }

            if let Ok(true) = self.was_transfer_performed_on_destination().await {
                return;
            }
        }
    }

    async fn wait_for_action_confirmation_on_source(&mut self) {
        for _ in 0..WAIT_SPLITS {
            if !self.wait_slice().await {
                return;
            }

            if let Ok(true) = self.was_action_performed_on_source().await {
                return;
            }
        }
    }
}

impl<S, D, T> StatusResolver for BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    async fn wait_and_return_final_batch_statuses(&mut self) -> ExecutorResult<Vec<u8>> {
        self.batch()?;

        for _ in 0..WAIT_SPLITS {
            if !self.wait_slice().await {
                return Err(ExecutorError::Cancelled);
            }

            match self.get_batch_statuses_from_destination().await {
                Ok(statuses) if statuses.is_empty() => debug!("no status available"),
                Ok(statuses) => {
                    debug!(statuses = %hex::encode(&statuses), "fetched final batch statuses");
                    return Ok(statuses);
                }
                Err(ExecutorError::Cancelled) => return Err(ExecutorError::Cancelled),
                Err(err) => debug!(%err, "got message while fetching batch statuses"),
            }
        }

        Ok(Vec::new())
    }

    async fn get_batch_statuses_from_destination(&mut self) -> ExecutorResult<Vec<u8>> {
        let batch_id = self.batch()?.id();

        with_cancel(
            &self.cancel,
            self.destination.get_transactions_statuses(batch_id),
        )
        .await
    }

    async fn get_batch_statuses_from_source(&mut self) -> ExecutorResult<Vec<u8>> {
        let batch_id = self.batch()?.id();

        with_cancel(&self.cancel, self.source.get_transactions_statuses(batch_id)).await
    }

    fn resolve_new_deposits_statuses(&mut self, num_deposits: usize) -> ExecutorResult<()> {
        self.batch
            .as_mut()
            .ok_or(ExecutorError::NilBatch)?
            .resolve_new_deposits(num_deposits);

        Ok(())
    }

    fn record_batch_outcome(&mut self) -> ExecutorResult<()> {
        let batch = self.batch()?;
        let executed = batch.count_statuses(DepositStatus::Executed);
        let rejected = batch.count_statuses(DepositStatus::Rejected);

        self.status
            .add_int_metric(METRIC_NUM_TRANSACTIONS_SUCCEEDED, metric_value(executed as u64));
        self.status
            .add_int_metric(METRIC_NUM_TRANSACTIONS_REJECTED, metric_value(rejected as u64));
        info!(batch_id = %batch.id(), %executed, %rejected, "batch finished");

        Ok(())
    }

    fn clear_stored_signatures(&mut self) {
        self.signatures.clear_stored_signatures();
        info!("cleared stored signatures");
    }
}

impl<S, D, T> QuorumRetries for BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    fn process_max_quorum_retries(&mut self, chain: Chain) -> bool {
        match chain {
            Chain::Source => self.source_retries.process(),
            Chain::Destination => self.destination_retries.process(),
        }
    }

    fn reset_quorum_retries(&mut self, chain: Chain) {
        match chain {
            Chain::Source => self.source_retries.reset(),
            Chain::Destination => self.destination_retries.reset(),
        }
    }
}

impl<S, D, T> HealthReporter for BridgeExecutor<S, D, T>
where
    S: SourceChainClient,
    D: DestinationChainClient,
    T: TopologyProvider,
{
    async fn check_client_availability(&mut self, chain: Chain) -> ExecutorResult<()> {
        match chain {
            Chain::Source => {
                with_cancel(&self.cancel, self.source.check_client_availability()).await
            }
            Chain::Destination => {
                with_cancel(&self.cancel, self.destination.check_client_availability()).await
            }
        }
    }

    fn set_last_error(&self, message: &str) {
        self.status.set_string_metric(METRIC_LAST_ERROR, message);
    }
}
