//! Simulated multisig ledgers.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use ethnum::U256;
use parking_lot::Mutex;
use relayer_primitives::{
    batch::TransferBatch,
    deposit::DepositTransfer,
    status::DepositStatus,
    types::{ActionId, BatchId, DepositNonce, MessageHash, INVALID_ACTION_ID},
};
use relayer_sm::signatures::SignedMessage;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned by the simulated ledgers, as a node would reject a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The sender is not a registered relayer.
    #[error("not a relayer: {0}")]
    NotRelayer(String),

    /// The action id is unknown.
    #[error("unknown action: {0}")]
    UnknownAction(ActionId),

    /// The action or batch was already proposed.
    #[error("already proposed: batch {0}")]
    AlreadyProposed(BatchId),

    /// The action or batch was already executed.
    #[error("already executed: {0}")]
    AlreadyExecuted(u64),

    /// Not enough valid signatures.
    #[error("quorum not reached: {found} of {required}")]
    QuorumNotReached {
        /// Valid signatures or signers found.
        found: usize,
        /// Signatures or signers required.
        required: usize,
    },

    /// The batch does not match what the ledger expects.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),
}

/// Computes the message relayers sign to approve the execution of `batch` on the destination
/// chain.
pub fn transfer_message_hash(batch: &TransferBatch) -> MessageHash {
    let mut hasher = Sha256::new();
    hasher.update(b"transfer");
    hasher.update(batch.id().to_be_bytes());

    for deposit in batch.deposits() {
        hasher.update(deposit.nonce.to_be_bytes());
        hasher.update(&deposit.to_bytes);
        hasher.update(&deposit.destination_token_bytes);
        hasher.update(deposit.amount.to_be_bytes());
        hasher.update(&deposit.data);
    }

    let digest: [u8; 32] = hasher.finalize().into();
    MessageHash::from(digest)
}

/// Signature of `hash` by the relayer owning `public_key`.
///
/// The simulation has no private keys: a signature is a keyed digest anyone can recompute.
pub fn simulated_signature(public_key: &[u8], hash: &MessageHash) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(b"signature");
    hasher.update(public_key);
    hasher.update(hash.as_bytes());

    hasher.finalize().to_vec()
}

/// Outcome of a deposit once executed: zero-amount deposits are rejected.
fn execution_status(deposit: &DepositTransfer) -> u8 {
    if deposit.amount == U256::ZERO {
        DepositStatus::Rejected.as_byte()
    } else {
        DepositStatus::Executed.as_byte()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActionKind {
    Transfer { batch_id: BatchId },
    SetStatus { batch_id: BatchId, statuses: Vec<u8> },
}

#[derive(Debug, Clone)]
struct Action {
    kind: ActionKind,
    batch: TransferBatch,
    signers: BTreeSet<Vec<u8>>,
    performed_by: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct SourceState {
    outgoing: VecDeque<TransferBatch>,
    finished: BTreeMap<BatchId, Vec<u8>>,
    incoming: BTreeMap<BatchId, Vec<u8>>,
    credited: Vec<DepositTransfer>,
    last_executed_batch_id: BatchId,
    last_executed_deposit_nonce: DepositNonce,
    actions: BTreeMap<ActionId, Action>,
    next_action_id: ActionId,
}

/// Action-based multisig: relayers propose an action, sign its id, and any relayer performs it
/// once `quorum` relayers signed.
///
/// Outgoing batches are served one at a time, oldest first, until their statuses are set.
#[derive(Debug)]
pub struct SourceLedger {
    relayers: BTreeSet<Vec<u8>>,
    quorum: usize,
    state: Mutex<SourceState>,
}

impl SourceLedger {
    /// Creates a ledger governed by `relayers`.
    pub fn new(relayers: impl IntoIterator<Item = Vec<u8>>, quorum: usize) -> Self {
        Self {
            relayers: relayers.into_iter().collect(),
            quorum,
            state: Mutex::new(SourceState {
                next_action_id: INVALID_ACTION_ID + 1,
                ..Default::default()
            }),
        }
    }

    fn check_relayer(&self, relayer: &[u8]) -> Result<(), LedgerError> {
        if !self.relayers.contains(relayer) {
            return Err(LedgerError::NotRelayer(
                String::from_utf8_lossy(relayer).into_owned(),
            ));
        }

        Ok(())
    }

    /// Queues a batch of user deposits to be bridged.
    pub fn deposit_batch(&self, batch: TransferBatch) {
        info!(batch_id = %batch.id(), num_deposits = %batch.deposits().len(), "source deposit");
        self.state.lock().outgoing.push_back(batch);
    }

    /// The oldest outgoing batch whose statuses were not set yet.
    pub fn pending_batch(&self) -> Option<TransferBatch> {
        self.state.lock().outgoing.front().cloned()
    }

    /// Number of outgoing batches still waiting for their statuses.
    pub fn num_pending_batches(&self) -> usize {
        self.state.lock().outgoing.len()
    }

    /// Statuses written for an outgoing batch.
    pub fn finished_statuses(&self, batch_id: BatchId) -> Option<Vec<u8>> {
        self.state.lock().finished.get(&batch_id).cloned()
    }

    /// Deposits credited on this chain from incoming batches.
    pub fn credited(&self) -> Vec<DepositTransfer> {
        self.state.lock().credited.clone()
    }

    /// Id of the last incoming batch executed.
    pub fn last_executed_batch_id(&self) -> BatchId {
        self.state.lock().last_executed_batch_id
    }

    /// Nonce of the last incoming deposit executed.
    pub fn last_executed_deposit_nonce(&self) -> DepositNonce {
        self.state.lock().last_executed_deposit_nonce
    }

    /// Statuses of an executed incoming batch, empty if not executed.
    pub fn incoming_statuses(&self, batch_id: BatchId) -> Vec<u8> {
        self.state
            .lock()
            .incoming
            .get(&batch_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of performed actions, per performer.
    pub fn performed_actions(&self) -> BTreeMap<Vec<u8>, usize> {
        let mut performed = BTreeMap::new();
        for performer in self
            .state
            .lock()
            .actions
            .values()
            .filter_map(|action| action.performed_by.clone())
        {
            *performed.entry(performer).or_default() += 1;
        }

        performed
    }

    fn find_action(&self, kind: &ActionKind) -> ActionId {
        self.state
            .lock()
            .actions
            .iter()
            .find(|(_, action)| &action.kind == kind)
            .map_or(INVALID_ACTION_ID, |(id, _)| *id)
    }

    fn was_proposed(&self, matches: impl Fn(&ActionKind) -> bool) -> bool {
        self.state
            .lock()
            .actions
            .values()
            .any(|action| matches(&action.kind))
    }

    fn propose(
        &self,
        relayer: &[u8],
        kind: ActionKind,
        batch: &TransferBatch,
    ) -> Result<ActionId, LedgerError> {
        self.check_relayer(relayer)?;

        let mut state = self.state.lock();
        if state.actions.values().any(|action| action.kind == kind) {
            return Err(LedgerError::AlreadyProposed(batch.id()));
        }

        let action_id = state.next_action_id;
        state.next_action_id += 1;
        state.actions.insert(
            action_id,
            Action {
                kind,
                batch: batch.clone(),
                signers: BTreeSet::new(),
                performed_by: None,
            },
        );
        debug!(%action_id, batch_id = %batch.id(), "action proposed");

        Ok(action_id)
    }

    /// Action id of the transfer proposal for `batch`, or the invalid id if not proposed.
    pub fn action_id_for_transfer(&self, batch: &TransferBatch) -> ActionId {
        self.find_action(&ActionKind::Transfer {
            batch_id: batch.id(),
        })
    }

    /// Action id of the set-status proposal carrying the statuses of `batch`, or the invalid id.
    pub fn action_id_for_set_status(&self, batch: &TransferBatch) -> ActionId {
        self.find_action(&ActionKind::SetStatus {
            batch_id: batch.id(),
            statuses: batch.statuses().to_vec(),
        })
    }

    /// Returns `true` if a transfer of `batch_id` was proposed.
    pub fn was_transfer_proposed(&self, batch_id: BatchId) -> bool {
        self.was_proposed(|kind| matches!(kind, ActionKind::Transfer { batch_id: id } if *id == batch_id))
    }

    /// Returns `true` if a set-status of `batch_id` was proposed.
    pub fn was_set_status_proposed(&self, batch_id: BatchId) -> bool {
        self.was_proposed(
            |kind| matches!(kind, ActionKind::SetStatus { batch_id: id, .. } if *id == batch_id),
        )
    }

    /// Proposes executing an incoming batch.
    pub fn propose_transfer(
        &self,
        relayer: &[u8],
        batch: &TransferBatch,
    ) -> Result<ActionId, LedgerError> {
        if batch.id() != self.last_executed_batch_id() + 1 {
            return Err(LedgerError::InvalidBatch(format!(
                "expected batch {}, got {}",
                self.last_executed_batch_id() + 1,
                batch.id()
            )));
        }

        self.propose(
            relayer,
            ActionKind::Transfer {
                batch_id: batch.id(),
            },
            batch,
        )
    }

    /// Proposes writing the statuses of the pending outgoing batch.
    pub fn propose_set_status(
        &self,
        relayer: &[u8],
        batch: &TransferBatch,
    ) -> Result<ActionId, LedgerError> {
        let pending = self
            .pending_batch()
            .ok_or_else(|| LedgerError::InvalidBatch("no pending batch".to_string()))?;
        if pending.id() != batch.id() || batch.statuses().len() != pending.deposits().len() {
            return Err(LedgerError::InvalidBatch(format!(
                "statuses do not fit pending batch {}",
                pending.id()
            )));
        }

        self.propose(
            relayer,
            ActionKind::SetStatus {
                batch_id: batch.id(),
                statuses: batch.statuses().to_vec(),
            },
            batch,
        )
    }

    /// Returns `true` if `relayer` signed `action_id`.
    pub fn was_signed(&self, relayer: &[u8], action_id: ActionId) -> bool {
        self.state
            .lock()
            .actions
            .get(&action_id)
            .is_some_and(|action| action.signers.contains(relayer))
    }

    /// Records the signature of `relayer` on `action_id`.
    pub fn sign(&self, relayer: &[u8], action_id: ActionId) -> Result<(), LedgerError> {
        self.check_relayer(relayer)?;

        let mut state = self.state.lock();
        let action = state
            .actions
            .get_mut(&action_id)
            .ok_or(LedgerError::UnknownAction(action_id))?;
        action.signers.insert(relayer.to_vec());

        Ok(())
    }

    /// Returns `true` if enough relayers signed `action_id`.
    pub fn quorum_reached(&self, action_id: ActionId) -> bool {
        self.state
            .lock()
            .actions
            .get(&action_id)
            .is_some_and(|action| action.signers.len() >= self.quorum)
    }

    /// Returns `true` if `action_id` was performed.
    pub fn was_executed(&self, action_id: ActionId) -> bool {
        self.state
            .lock()
            .actions
            .get(&action_id)
            .is_some_and(|action| action.performed_by.is_some())
    }

    /// Performs `action_id`.
    pub fn perform_action(&self, relayer: &[u8], action_id: ActionId) -> Result<(), LedgerError> {
        self.check_relayer(relayer)?;

        let mut state = self.state.lock();
        let action = state
            .actions
            .get_mut(&action_id)
            .ok_or(LedgerError::UnknownAction(action_id))?;
        if action.performed_by.is_some() {
            return Err(LedgerError::AlreadyExecuted(action_id));
        }
        if action.signers.len() < self.quorum {
            return Err(LedgerError::QuorumNotReached {
                found: action.signers.len(),
                required: self.quorum,
            });
        }

        action.performed_by = Some(relayer.to_vec());
        let kind = action.kind.clone();
        let batch = action.batch.clone();

        match kind {
            ActionKind::Transfer { batch_id } => {
                let statuses = batch.deposits().iter().map(execution_status).collect();
                state.incoming.insert(batch_id, statuses);
                state.last_executed_batch_id = batch_id;
                if let Some(last) = batch.deposits().last() {
                    state.last_executed_deposit_nonce = last.nonce;
                }
                state.credited.extend(batch.deposits().iter().cloned());
                info!(%batch_id, %action_id, "incoming batch executed on source");
            }
            ActionKind::SetStatus { batch_id, statuses } => {
                if state.outgoing.front().map(TransferBatch::id) == Some(batch_id) {
                    state.outgoing.pop_front();
                }
                state.finished.insert(batch_id, statuses);
                info!(%batch_id, %action_id, "statuses set on source");
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
struct DestinationState {
    outgoing: Vec<TransferBatch>,
    incoming: BTreeMap<BatchId, Vec<u8>>,
    executed_by: BTreeMap<BatchId, Vec<u8>>,
    credited: Vec<DepositTransfer>,
}

/// Signature-based multisig: a transfer executes when submitted with `quorum` valid signatures
/// from distinct relayers over its message hash.
///
/// Outgoing batches are indexed by id, starting at 1.
#[derive(Debug)]
pub struct DestinationLedger {
    relayers: BTreeSet<Vec<u8>>,
    quorum: usize,
    state: Mutex<DestinationState>,
}

impl DestinationLedger {
    /// Creates a ledger governed by `relayers`.
    pub fn new(relayers: impl IntoIterator<Item = Vec<u8>>, quorum: usize) -> Self {
        Self {
            relayers: relayers.into_iter().collect(),
            quorum,
            state: Mutex::new(DestinationState::default()),
        }
    }

    /// The number of signatures a transfer needs.
    pub const fn quorum(&self) -> usize {
        self.quorum
    }

    /// Appends an outgoing batch made of `deposits`, returning its id.
    pub fn deposit(&self, deposits: Vec<DepositTransfer>) -> BatchId {
        let mut state = self.state.lock();
        let batch_id = state.outgoing.len() as BatchId + 1;
        info!(%batch_id, num_deposits = %deposits.len(), "destination deposit");
        state.outgoing.push(TransferBatch::new(batch_id, deposits));

        batch_id
    }

    /// The outgoing batch with id `batch_id`.
    pub fn batch(&self, batch_id: BatchId) -> Option<TransferBatch> {
        let index = usize::try_from(batch_id).ok()?.checked_sub(1)?;
        self.state.lock().outgoing.get(index).cloned()
    }

    /// Returns `true` if the incoming batch was executed.
    pub fn was_executed(&self, batch_id: BatchId) -> bool {
        self.state.lock().incoming.contains_key(&batch_id)
    }

    /// Statuses of an executed incoming batch, empty if not executed.
    pub fn statuses(&self, batch_id: BatchId) -> Vec<u8> {
        self.state
            .lock()
            .incoming
            .get(&batch_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Deposits credited on this chain.
    pub fn credited(&self) -> Vec<DepositTransfer> {
        self.state.lock().credited.clone()
    }

    /// The relayer that executed an incoming batch.
    pub fn executed_by(&self, batch_id: BatchId) -> Option<Vec<u8>> {
        self.state.lock().executed_by.get(&batch_id).cloned()
    }

    /// Executes an incoming batch.
    pub fn execute_transfer(
        &self,
        relayer: &[u8],
        batch: &TransferBatch,
        signatures: &[SignedMessage],
    ) -> Result<(), LedgerError> {
        if !self.relayers.contains(relayer) {
            return Err(LedgerError::NotRelayer(
                String::from_utf8_lossy(relayer).into_owned(),
            ));
        }

        let hash = transfer_message_hash(batch);
        let signers: BTreeSet<&[u8]> = signatures
            .iter()
            .filter(|message| {
                message.message_hash == hash
                    && self.relayers.contains(&message.public_key)
                    && message.signature == simulated_signature(&message.public_key, &hash)
            })
            .map(|message| message.public_key.as_slice())
            .collect();
        if signers.len() < self.quorum {
            return Err(LedgerError::QuorumNotReached {
                found: signers.len(),
                required: self.quorum,
            });
        }

        let mut state = self.state.lock();
        if state.incoming.contains_key(&batch.id()) {
            return Err(LedgerError::AlreadyExecuted(batch.id()));
        }

        let statuses = batch.deposits().iter().map(execution_status).collect();
        state.incoming.insert(batch.id(), statuses);
        state.executed_by.insert(batch.id(), relayer.to_vec());
        state.credited.extend(batch.deposits().iter().cloned());
        info!(batch_id = %batch.id(), "incoming batch executed on destination");

        Ok(())
    }
}
