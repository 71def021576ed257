//! In-memory chain clients for executor tests.

use std::sync::Arc;

use parking_lot::Mutex;
use relayer_primitives::{
    batch::TransferBatch,
    types::{ActionId, BatchId, DepositNonce, MessageHash},
};
use relayer_topology::TopologyProvider;

use crate::clients::{ClientError, ClientResult, DestinationChainClient, SourceChainClient};

fn injected<T>(failing: bool, value: T) -> ClientResult<T> {
    if failing {
        return Err(ClientError::Rpc("injected".to_string()));
    }

    Ok(value)
}

/// Answers polled by the executor; `ready_at_poll` flips the answer after that many polls.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Polled {
    pub(crate) ready_at_poll: Option<usize>,
    pub(crate) polls: usize,
}

impl Polled {
    fn poll(&mut self) -> bool {
        self.polls += 1;
        self.ready_at_poll.is_some_and(|at| self.polls >= at)
    }
}

#[derive(Debug, Default)]
pub(crate) struct SourceState {
    pub(crate) failing: bool,
    pub(crate) max_retries: u64,
    pub(crate) pending: Option<TransferBatch>,
    pub(crate) last_executed_batch_id: BatchId,
    pub(crate) last_executed_nonce: DepositNonce,
    pub(crate) action_id: ActionId,
    pub(crate) quorum: bool,
    pub(crate) executed: Polled,
    pub(crate) statuses: Vec<u8>,
    pub(crate) signed: Vec<ActionId>,
    pub(crate) performed: Vec<ActionId>,
}

/// Source client backed by a shared [`SourceState`].
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeSourceClient {
    pub(crate) state: Arc<Mutex<SourceState>>,
}

impl FakeSourceClient {
    pub(crate) fn new(max_retries: u64) -> Self {
        let client = Self::default();
        client.state.lock().max_retries = max_retries;
        client
    }
}

impl SourceChainClient for FakeSourceClient {
    async fn get_pending_batch(&self) -> ClientResult<Option<TransferBatch>> {
        let state = self.state.lock();
        injected(state.failing, state.pending.clone())
    }

    async fn get_last_executed_batch_id(&self) -> ClientResult<BatchId> {
        let state = self.state.lock();
        injected(state.failing, state.last_executed_batch_id)
    }

    async fn get_last_executed_deposit_nonce(&self) -> ClientResult<DepositNonce> {
        let state = self.state.lock();
        injected(state.failing, state.last_executed_nonce)
    }

    async fn get_action_id_for_propose_transfer(
        &self,
        _batch: &TransferBatch,
    ) -> ClientResult<ActionId> {
        let state = self.state.lock();
        injected(state.failing, state.action_id)
    }

    async fn get_action_id_for_set_status(&self, _batch: &TransferBatch) -> ClientResult<ActionId> {
        let state = self.state.lock();
        injected(state.failing, state.action_id)
    }

    async fn was_transfer_proposed(&self, _batch: &TransferBatch) -> ClientResult<bool> {
        injected(self.state.lock().failing, false)
    }

    async fn propose_transfer(&self, batch: &TransferBatch) -> ClientResult<String> {
        injected(self.state.lock().failing, format!("propose-transfer-{}", batch.id()))
    }

    async fn was_set_status_proposed(&self, _batch: &TransferBatch) -> ClientResult<bool> {
        injected(self.state.lock().failing, false)
    }

    async fn propose_set_status(&self, batch: &TransferBatch) -> ClientResult<String> {
        injected(self.state.lock().failing, format!("propose-status-{}", batch.id()))
    }

    async fn was_signed(&self, action_id: ActionId) -> ClientResult<bool> {
        let state = self.state.lock();
        injected(state.failing, state.signed.contains(&action_id))
    }

    async fn sign(&self, action_id: ActionId) -> ClientResult<String> {
        let mut state = self.state.lock();
        state.signed.push(action_id);
        injected(state.failing, format!("sign-{action_id}"))
    }

    async fn quorum_reached(&self, _action_id: ActionId) -> ClientResult<bool> {
        let state = self.state.lock();
        injected(state.failing, state.quorum)
    }

    async fn was_executed(&self, _action_id: ActionId) -> ClientResult<bool> {
        let mut state = self.state.lock();
        let executed = state.executed.poll();
        injected(state.failing, executed)
    }

    async fn perform_action(
        &self,
        action_id: ActionId,
        _batch: &TransferBatch,
    ) -> ClientResult<String> {
        let mut state = self.state.lock();
        state.performed.push(action_id);
        injected(state.failing, format!("perform-{action_id}"))
    }

    async fn get_transactions_statuses(&self, _batch_id: BatchId) -> ClientResult<Vec<u8>> {
        let state = self.state.lock();
        injected(state.failing, state.statuses.clone())
    }

    fn max_retries_on_quorum_reached(&self) -> u64 {
        self.state.lock().max_retries
    }

    async fn check_client_availability(&self) -> ClientResult<()> {
        injected(self.state.lock().failing, ())
    }

    async fn close(&self) -> ClientResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct DestinationState {
    pub(crate) failing: bool,
    pub(crate) max_retries: u64,
    pub(crate) batch: Option<TransferBatch>,
    pub(crate) executed: Polled,
    pub(crate) quorum_size: u64,
    pub(crate) quorum: bool,
    pub(crate) statuses: Vec<u8>,
    pub(crate) statuses_ready: Polled,
    pub(crate) broadcasts: Vec<MessageHash>,
    pub(crate) executed_with: Option<(MessageHash, u64)>,
}

/// Destination client backed by a shared [`DestinationState`].
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeDestinationClient {
    pub(crate) state: Arc<Mutex<DestinationState>>,
}

impl FakeDestinationClient {
    pub(crate) fn new(max_retries: u64) -> Self {
        let client = Self::default();
        client.state.lock().max_retries = max_retries;
        client
    }
}

impl DestinationChainClient for FakeDestinationClient {
    async fn get_batch(&self, _nonce: BatchId) -> ClientResult<Option<TransferBatch>> {
        let state = self.state.lock();
        injected(state.failing, state.batch.clone())
    }

    async fn was_executed(&self, _batch_id: BatchId) -> ClientResult<bool> {
        let mut state = self.state.lock();
        let executed = state.executed.poll();
        injected(state.failing, executed)
    }

    fn generate_message_hash(&self, batch: &TransferBatch) -> ClientResult<MessageHash> {
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&batch.id().to_be_bytes());

        injected(self.state.lock().failing, MessageHash::from(hash))
    }

    fn broadcast_signature_for_message_hash(&self, hash: MessageHash) {
        self.state.lock().broadcasts.push(hash);
    }

    async fn execute_transfer(
        &self,
        hash: MessageHash,
        batch: &TransferBatch,
        quorum: u64,
    ) -> ClientResult<String> {
        let mut state = self.state.lock();
        state.executed_with = Some((hash, quorum));
        injected(state.failing, format!("execute-{}", batch.id()))
    }

    async fn get_quorum_size(&self) -> ClientResult<u64> {
        let state = self.state.lock();
        injected(state.failing, state.quorum_size)
    }

    async fn is_quorum_reached(&self, _hash: MessageHash) -> ClientResult<bool> {
        let state = self.state.lock();
        injected(state.failing, state.quorum)
    }

    async fn get_transactions_statuses(&self, _batch_id: BatchId) -> ClientResult<Vec<u8>> {
        let mut state = self.state.lock();
        let statuses = if state.statuses_ready.poll() {
            state.statuses.clone()
        } else {
            Vec::new()
        };

        injected(state.failing, statuses)
    }

    fn max_retries_on_quorum_reached(&self) -> u64 {
        self.state.lock().max_retries
    }

    async fn check_client_availability(&self) -> ClientResult<()> {
        injected(self.state.lock().failing, ())
    }
}

/// Topology with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedLeader(pub(crate) bool);

impl TopologyProvider for FixedLeader {
    fn my_turn_as_leader(&self) -> bool {
        self.0
    }
}
