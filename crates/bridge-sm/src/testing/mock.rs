//! Scripted executor for step graph tests.

use parking_lot::Mutex;
use relayer_primitives::{
    batch::TransferBatch,
    types::{ActionId, BatchId, INVALID_ACTION_ID},
};

use crate::{
    clients::ClientError,
    errors::{ExecutorError, ExecutorResult},
    executor::{
        capabilities::{
            ActionProposer, BatchFetcher, BatchStore, Chain, ConfirmationWaiter, HealthReporter,
            LeaderElection, QuorumRetries, StatusResolver, TransferSigner,
        },
        retries::RetryCounter,
    },
};

/// Executor double whose answers are plain fields.
///
/// Every call is recorded by name. The call named by `fail_on` returns an injected client
/// error. Mutating calls flip the matching `was_*` answer, mimicking a chain that executes
/// every submitted transaction immediately.
#[derive(Debug)]
pub(crate) struct MockExecutor {
    pub(crate) calls: Vec<&'static str>,
    pub(crate) fail_on: Option<&'static str>,

    pub(crate) batch: Option<TransferBatch>,
    pub(crate) action_id: ActionId,

    pub(crate) pending_on_source: Option<TransferBatch>,
    pub(crate) destination_batch: Option<TransferBatch>,
    pub(crate) last_executed_batch_id: BatchId,
    pub(crate) chain_action_id: ActionId,

    pub(crate) leader: bool,
    pub(crate) transfer_performed_on_destination: bool,
    pub(crate) transfer_proposed: bool,
    pub(crate) set_status_proposed: bool,
    pub(crate) action_signed: bool,
    pub(crate) action_performed: bool,
    pub(crate) quorum_on_source: bool,
    pub(crate) quorum_on_destination: bool,
    pub(crate) executes_on_submit: bool,

    pub(crate) final_statuses: Vec<u8>,
    pub(crate) source_statuses: Vec<u8>,
    pub(crate) resolved_with: Option<usize>,
    pub(crate) outcomes_recorded: usize,

    pub(crate) source_retries: RetryCounter,
    pub(crate) destination_retries: RetryCounter,
    pub(crate) last_error: Mutex<Option<String>>,
}

impl MockExecutor {
    /// A mock on which every cycle runs to completion when leader.
    pub(crate) fn new(max_retries: u64) -> Self {
        Self {
            calls: Vec::new(),
            fail_on: None,
            batch: None,
            action_id: INVALID_ACTION_ID,
            pending_on_source: None,
            destination_batch: None,
            last_executed_batch_id: 0,
            chain_action_id: 7,
            leader: true,
            transfer_performed_on_destination: false,
            transfer_proposed: false,
            set_status_proposed: false,
            action_signed: false,
            action_performed: false,
            quorum_on_source: true,
            quorum_on_destination: true,
            executes_on_submit: true,
            final_statuses: Vec::new(),
            source_statuses: Vec::new(),
            resolved_with: None,
            outcomes_recorded: 0,
            source_retries: RetryCounter::new(max_retries),
            destination_retries: RetryCounter::new(max_retries),
            last_error: Mutex::new(None),
        }
    }

    /// Returns `true` if `name` was called.
    pub(crate) fn called(&self, name: &str) -> bool {
        self.calls.contains(&name)
    }

    /// Forgets the recorded calls.
    pub(crate) fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// The last error published through [`HealthReporter::set_last_error`].
    pub(crate) fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn call(&mut self, name: &'static str) -> ExecutorResult<()> {
        self.calls.push(name);
        if self.fail_on == Some(name) {
            return Err(ExecutorError::Client(ClientError::Rpc(format!(
                "injected failure in {name}"
            ))));
        }

        Ok(())
    }

    fn batch(&self) -> ExecutorResult<&TransferBatch> {
        self.batch.as_ref().ok_or(ExecutorError::NilBatch)
    }
}

impl BatchStore for MockExecutor {
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
        self.call("set_stored_batch_statuses")?;
        self.batch
            .as_mut()
            .ok_or(ExecutorError::NilBatch)?
            .set_statuses(statuses);

        Ok(())
    }

    fn clear_cycle_state(&mut self) {
        self.calls.push("clear_cycle_state");
        self.batch = None;
        self.action_id = INVALID_ACTION_ID;
    }
}

impl LeaderElection for MockExecutor {
    fn my_turn_as_leader(&self) -> bool {
        self.leader
    }
}

impl BatchFetcher for MockExecutor {
    async fn get_batch_from_source(&mut self) -> ExecutorResult<Option<TransferBatch>> {
        self.call("get_batch_from_source")?;
        Ok(self.pending_on_source.clone())
    }

    async fn get_last_executed_batch_id_from_source(&mut self) -> ExecutorResult<BatchId> {
        self.call("get_last_executed_batch_id_from_source")?;
        Ok(self.last_executed_batch_id)
    }

    async fn get_and_store_batch_from_destination(&mut self, nonce: BatchId) -> ExecutorResult<()> {
        self.call("get_and_store_batch_from_destination")?;
        match &self.destination_batch {
            Some(batch) if batch.id() == nonce && !batch.deposits().is_empty() => {
                self.batch = Some(batch.clone());
                Ok(())
            }
            other => Err(ExecutorError::BatchNotFound {
                requested: nonce,
                fetched: other.as_ref().map_or(0, TransferBatch::id),
                num_deposits: other.as_ref().map_or(0, |b| b.deposits().len()),
            }),
        }
    }

    async fn verify_last_deposit_nonce_executed_on_source(&mut self) -> ExecutorResult<()> {
        self.call("verify_last_deposit_nonce_executed_on_source")?;
        self.batch().map(|_| ())
    }
}

impl ActionProposer for MockExecutor {
    async fn get_and_store_action_id_for_propose_transfer(&mut self) -> ExecutorResult<ActionId> {
        self.call("get_and_store_action_id_for_propose_transfer")?;
        self.action_id = self.chain_action_id;
        Ok(self.action_id)
    }

    async fn get_and_store_action_id_for_propose_set_status(&mut self) -> ExecutorResult<ActionId> {
        self.call("get_and_store_action_id_for_propose_set_status")?;
        self.action_id = self.chain_action_id;
        Ok(self.action_id)
    }

    async fn was_transfer_proposed_on_source(&mut self) -> ExecutorResult<bool> {
        self.call("was_transfer_proposed_on_source")?;
        Ok(self.transfer_proposed)
    }

    async fn propose_transfer_on_source(&mut self) -> ExecutorResult<()> {
        self.call("propose_transfer_on_source")?;
        self.transfer_proposed = true;
        Ok(())
    }

    async fn was_set_status_proposed_on_source(&mut self) -> ExecutorResult<bool> {
        self.call("was_set_status_proposed_on_source")?;
        Ok(self.set_status_proposed)
    }

    async fn propose_set_status_on_source(&mut self) -> ExecutorResult<()> {
        self.call("propose_set_status_on_source")?;
        self.set_status_proposed = true;
        Ok(())
    }

    async fn was_action_signed_on_source(&mut self) -> ExecutorResult<bool> {
        self.call("was_action_signed_on_source")?;
        Ok(self.action_signed)
    }

    async fn sign_action_on_source(&mut self) -> ExecutorResult<()> {
        self.call("sign_action_on_source")?;
        self.action_signed = true;
        Ok(())
    }

    async fn process_quorum_reached_on_source(&mut self) -> ExecutorResult<bool> {
        self.call("process_quorum_reached_on_source")?;
        Ok(self.quorum_on_source)
    }

    async fn was_action_performed_on_source(&mut self) -> ExecutorResult<bool> {
        self.call("was_action_performed_on_source")?;
        Ok(self.action_performed)
    }

    async fn perform_action_on_source(&mut self) -> ExecutorResult<()> {
        self.call("perform_action_on_source")?;
        self.action_performed = self.executes_on_submit;
        Ok(())
    }
}

impl TransferSigner for MockExecutor {
    async fn was_transfer_performed_on_destination(&mut self) -> ExecutorResult<bool> {
        self.call("was_transfer_performed_on_destination")?;
        Ok(self.transfer_performed_on_destination)
    }

    fn sign_transfer_on_destination(&mut self) -> ExecutorResult<()> {
        self.call("sign_transfer_on_destination")?;
        self.batch().map(|_| ())
    }

    async fn process_quorum_reached_on_destination(&mut self) -> ExecutorResult<bool> {
        self.call("process_quorum_reached_on_destination")?;
        Ok(self.quorum_on_destination)
    }

    async fn perform_transfer_on_destination(&mut self) -> ExecutorResult<()> {
        self.call("perform_transfer_on_destination")?;
        self.transfer_performed_on_destination = self.executes_on_submit;
        Ok(())
    }
}

impl ConfirmationWaiter for MockExecutor {
    async fn wait_for_transfer_confirmation_on_destination(&mut self) {
        self.calls.push("wait_for_transfer_confirmation_on_destination");
    }

    async fn wait_for_action_confirmation_on_source(&mut self) {
        self.calls.push("wait_for_action_confirmation_on_source");
    }
}

impl StatusResolver for MockExecutor {
    async fn wait_and_return_final_batch_statuses(&mut self) -> ExecutorResult<Vec<u8>> {
        self.call("wait_and_return_final_batch_statuses")?;
        Ok(self.final_statuses.clone())
    }

    async fn get_batch_statuses_from_destination(&mut self) -> ExecutorResult<Vec<u8>> {
        self.call("get_batch_statuses_from_destination")?;
        Ok(self.final_statuses.clone())
    }

    async fn get_batch_statuses_from_source(&mut self) -> ExecutorResult<Vec<u8>> {
        self.call("get_batch_statuses_from_source")?;
        Ok(self.source_statuses.clone())
    }

    fn resolve_new_deposits_statuses(&mut self, num_deposits: usize) -> ExecutorResult<()> {
        self.call("resolve_new_deposits_statuses")?;
        self.batch
            .as_mut()
            .ok_or(ExecutorError::NilBatch)?
            .resolve_new_deposits(num_deposits);
        self.resolved_with = Some(num_deposits);

        Ok(())
    }

    fn record_batch_outcome(&mut self) -> ExecutorResult<()> {
        self.call("record_batch_outcome")?;
        self.outcomes_recorded += 1;
        Ok(())
    }

    fn clear_stored_signatures(&mut self) {
        self.calls.push("clear_stored_signatures");
    }
}

impl QuorumRetries for MockExecutor {
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

impl HealthReporter for MockExecutor {
    async fn check_client_availability(&mut self, chain: Chain) -> ExecutorResult<()> {
        match chain {
            Chain::Source => self.call("check_source_availability"),
            Chain::Destination => self.call("check_destination_availability"),
        }
    }

    fn set_last_error(&self, message: &str) {
        *self.last_error.lock() = Some(message.to_string());
    }
}
