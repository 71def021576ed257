//! Chain clients over the simulated ledgers.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use relayer_primitives::{
    batch::TransferBatch,
    token::{resolve_destination_tokens, TokenMapper},
    types::{ActionId, BatchId, DepositNonce, MessageHash},
};
use relayer_sm::{
    clients::{ClientError, ClientResult, DestinationChainClient, SourceChainClient},
    signatures::{SignaturesHolder, SignedMessage},
};
use tracing::{debug, warn};

use crate::ledger::{
    simulated_signature, transfer_message_hash, DestinationLedger, LedgerError, SourceLedger,
};

/// Fills in the displayable call data of every deposit that carries a call.
///
/// A malformed payload is logged and left undisplayed; the batch is still returned.
fn describe_call_data(batch: &mut TransferBatch) {
    for deposit in batch.deposits_mut().iter_mut().filter(|d| d.has_call_data()) {
        if let Err(err) = deposit.refresh_displayable_data() {
            warn!(nonce = %deposit.nonce, %err, "failed to convert call data to displayable data");
        }
    }
}

impl From<LedgerError> for ClientError {
    fn from(err: LedgerError) -> Self {
        ClientError::Rpc(err.to_string())
    }
}

/// Token pairs known to both chains.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenMapper {
    pairs: HashMap<Vec<u8>, Vec<u8>>,
}

impl StaticTokenMapper {
    /// Creates a mapper from `(source token, destination token)` pairs.
    pub fn new(pairs: impl IntoIterator<Item = (Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// The same pairs, mapped the other way around.
    pub fn reversed(&self) -> Self {
        Self::new(
            self.pairs
                .iter()
                .map(|(source, destination)| (destination.clone(), source.clone())),
        )
    }
}

impl TokenMapper for StaticTokenMapper {
    type Error = ClientError;

    async fn convert_token(&self, source_token: &[u8]) -> Result<Vec<u8>, Self::Error> {
        self.pairs.get(source_token).cloned().ok_or_else(|| {
            ClientError::InvalidResponse(format!(
                "unknown token {}",
                String::from_utf8_lossy(source_token)
            ))
        })
    }
}

/// Delivers signed messages to every subscribed relayer, the sender included.
#[derive(Debug, Default)]
pub struct Gossip {
    subscribers: RwLock<Vec<Arc<SignaturesHolder>>>,
}

impl Gossip {
    /// Creates a gossip layer without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers future messages to `holder`.
    pub fn subscribe(&self, holder: Arc<SignaturesHolder>) {
        self.subscribers.write().push(holder);
    }

    /// Delivers `message` to every subscriber.
    pub fn broadcast(&self, message: SignedMessage) {
        for holder in self.subscribers.read().iter() {
            holder.process_new_message(message.clone());
        }
    }
}

/// [`SourceChainClient`] of one relayer.
#[derive(Debug, Clone)]
pub struct SimulatedSourceClient {
    ledger: Arc<SourceLedger>,
    relayer: Vec<u8>,
    tokens: StaticTokenMapper,
    max_retries: u64,
}

impl SimulatedSourceClient {
    /// Creates the client of `relayer`.
    pub fn new(
        ledger: Arc<SourceLedger>,
        relayer: Vec<u8>,
        tokens: StaticTokenMapper,
        max_retries: u64,
    ) -> Self {
        Self {
            ledger,
            relayer,
            tokens,
            max_retries,
        }
    }
}

impl SourceChainClient for SimulatedSourceClient {
    async fn get_pending_batch(&self) -> ClientResult<Option<TransferBatch>> {
        let Some(mut batch) = self.ledger.pending_batch() else {
            return Ok(None);
        };
        resolve_destination_tokens(&mut batch, &self.tokens).await?;
        describe_call_data(&mut batch);

        Ok(Some(batch))
    }

    async fn get_last_executed_batch_id(&self) -> ClientResult<BatchId> {
        Ok(self.ledger.last_executed_batch_id())
    }

    async fn get_last_executed_deposit_nonce(&self) -> ClientResult<DepositNonce> {
        Ok(self.ledger.last_executed_deposit_nonce())
    }

    async fn get_action_id_for_propose_transfer(
        &self,
        batch: &TransferBatch,
    ) -> ClientResult<ActionId> {
        Ok(self.ledger.action_id_for_transfer(batch))
    }

    async fn get_action_id_for_set_status(&self, batch: &TransferBatch) -> ClientResult<ActionId> {
        Ok(self.ledger.action_id_for_set_status(batch))
    }

    async fn was_transfer_proposed(&self, batch: &TransferBatch) -> ClientResult<bool> {
        Ok(self.ledger.was_transfer_proposed(batch.id()))
    }

    async fn propose_transfer(&self, batch: &TransferBatch) -> ClientResult<String> {
        let action_id = self.ledger.propose_transfer(&self.relayer, batch)?;
        Ok(format!("propose-transfer-{action_id}"))
    }

    async fn was_set_status_proposed(&self, batch: &TransferBatch) -> ClientResult<bool> {
        Ok(self.ledger.was_set_status_proposed(batch.id()))
    }

    async fn propose_set_status(&self, batch: &TransferBatch) -> ClientResult<String> {
        let action_id = self.ledger.propose_set_status(&self.relayer, batch)?;
        Ok(format!("propose-set-status-{action_id}"))
    }

    async fn was_signed(&self, action_id: ActionId) -> ClientResult<bool> {
        Ok(self.ledger.was_signed(&self.relayer, action_id))
    }

    async fn sign(&self, action_id: ActionId) -> ClientResult<String> {
        self.ledger.sign(&self.relayer, action_id)?;
        Ok(format!("sign-{action_id}"))
    }

    async fn quorum_reached(&self, action_id: ActionId) -> ClientResult<bool> {
        Ok(self.ledger.quorum_reached(action_id))
    }

    async fn was_executed(&self, action_id: ActionId) -> ClientResult<bool> {
        Ok(self.ledger.was_executed(action_id))
    }

    async fn perform_action(
        &self,
        action_id: ActionId,
        _batch: &TransferBatch,
    ) -> ClientResult<String> {
        self.ledger.perform_action(&self.relayer, action_id)?;
        Ok(format!("perform-{action_id}"))
    }

    async fn get_transactions_statuses(&self, batch_id: BatchId) -> ClientResult<Vec<u8>> {
        Ok(self.ledger.incoming_statuses(batch_id))
    }

    fn max_retries_on_quorum_reached(&self) -> u64 {
        self.max_retries
    }

    async fn check_client_availability(&self) -> ClientResult<()> {
        Ok(())
    }

    async fn close(&self) -> ClientResult<()> {
        debug!(relayer = %String::from_utf8_lossy(&self.relayer), "source client closed");
        Ok(())
    }
}

/// [`DestinationChainClient`] of one relayer.
#[derive(Debug, Clone)]
pub struct SimulatedDestinationClient {
    ledger: Arc<DestinationLedger>,
    relayer: Vec<u8>,
    signatures: Arc<SignaturesHolder>,
    gossip: Arc<Gossip>,
    tokens: StaticTokenMapper,
    max_retries: u64,
}

impl SimulatedDestinationClient {
    /// Creates the client of `relayer`, reading signatures from its own `signatures` holder and
    /// publishing its own through `gossip`.
    pub fn new(
        ledger: Arc<DestinationLedger>,
        relayer: Vec<u8>,
        signatures: Arc<SignaturesHolder>,
        gossip: Arc<Gossip>,
        tokens: StaticTokenMapper,
        max_retries: u64,
    ) -> Self {
        Self {
            ledger,
            relayer,
            signatures,
            gossip,
            tokens,
            max_retries,
        }
    }

    fn gathered(&self, hash: &MessageHash) -> Vec<SignedMessage> {
        self.signatures
            .all_stored_signatures()
            .into_iter()
            .filter(|message| message.message_hash == *hash)
            .collect()
    }
}

impl DestinationChainClient for SimulatedDestinationClient {
    async fn get_batch(&self, nonce: BatchId) -> ClientResult<Option<TransferBatch>> {
        let Some(mut batch) = self.ledger.batch(nonce) else {
            return Ok(None);
        };
        resolve_destination_tokens(&mut batch, &self.tokens).await?;
        describe_call_data(&mut batch);

        Ok(Some(batch))
    }

    async fn was_executed(&self, batch_id: BatchId) -> ClientResult<bool> {
        Ok(self.ledger.was_executed(batch_id))
    }

    fn generate_message_hash(&self, batch: &TransferBatch) -> ClientResult<MessageHash> {
        Ok(transfer_message_hash(batch))
    }

    fn broadcast_signature_for_message_hash(&self, hash: MessageHash) {
        self.gossip.broadcast(SignedMessage {
            public_key: self.relayer.clone(),
            message_hash: hash,
            signature: simulated_signature(&self.relayer, &hash),
        });
    }

    async fn execute_transfer(
        &self,
        hash: MessageHash,
        batch: &TransferBatch,
        quorum: u64,
    ) -> ClientResult<String> {
        let quorum = usize::try_from(quorum)
            .map_err(|_| ClientError::InvalidResponse(format!("quorum {quorum} too large")))?;
        let signatures: Vec<_> = self.gathered(&hash).into_iter().take(quorum).collect();

        self.ledger
            .execute_transfer(&self.relayer, batch, &signatures)?;

        Ok(format!("execute-{}", batch.id()))
    }

    async fn get_quorum_size(&self) -> ClientResult<u64> {
        Ok(self.ledger.quorum() as u64)
    }

    async fn is_quorum_reached(&self, hash: MessageHash) -> ClientResult<bool> {
        Ok(self.gathered(&hash).len() >= self.ledger.quorum())
    }

    async fn get_transactions_statuses(&self, batch_id: BatchId) -> ClientResult<Vec<u8>> {
        Ok(self.ledger.statuses(batch_id))
    }

    fn max_retries_on_quorum_reached(&self) -> u64 {
        self.max_retries
    }

    async fn check_client_availability(&self) -> ClientResult<()> {
        Ok(())
    }
}
