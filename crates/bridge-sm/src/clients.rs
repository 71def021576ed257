//! Boundary towards the two chains.
//!
//! The relayer core only consumes these traits. The *source* chain runs an action-based
//! multisig: relayers propose an action, sign its id and one of them performs it once quorum is
//! reached. The *destination* chain runs a signature-based multisig: relayers sign a message hash
//! off-chain and one of them submits the transfer together with a quorum of signatures.

use std::future::Future;

use relayer_primitives::{
    batch::TransferBatch,
    types::{ActionId, BatchId, DepositNonce, MessageHash},
};
use thiserror::Error;

/// Errors surfaced by chain clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The RPC call failed (network, node unavailable, rejected request).
    #[error("rpc call failed: {0}")]
    Rpc(String),

    /// The chain answered with data the client could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The client considers its node unusable.
    #[error("client unavailable: {0}")]
    Unavailable(String),
}

/// The result type for chain client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client of the action-based chain.
pub trait SourceChainClient: Send + Sync {
    /// Returns the batch currently pending on this chain, if any.
    fn get_pending_batch(&self) -> impl Future<Output = ClientResult<Option<TransferBatch>>> + Send;

    /// Returns the id of the last batch coming from the destination chain that was executed here.
    fn get_last_executed_batch_id(&self) -> impl Future<Output = ClientResult<BatchId>> + Send;

    /// Returns the nonce of the last deposit coming from the destination chain that was executed
    /// here.
    fn get_last_executed_deposit_nonce(
        &self,
    ) -> impl Future<Output = ClientResult<DepositNonce>> + Send;

    /// Returns the action id of the transfer proposal for `batch`.
    fn get_action_id_for_propose_transfer(
        &self,
        batch: &TransferBatch,
    ) -> impl Future<Output = ClientResult<ActionId>> + Send;

    /// Returns the action id of the set-status proposal for `batch`.
    fn get_action_id_for_set_status(
        &self,
        batch: &TransferBatch,
    ) -> impl Future<Output = ClientResult<ActionId>> + Send;

    /// Returns `true` if some relayer already proposed the transfer of `batch`.
    fn was_transfer_proposed(
        &self,
        batch: &TransferBatch,
    ) -> impl Future<Output = ClientResult<bool>> + Send;

    /// Proposes the transfer of `batch`, returning the transaction hash.
    fn propose_transfer(
        &self,
        batch: &TransferBatch,
    ) -> impl Future<Output = ClientResult<String>> + Send;

    /// Returns `true` if some relayer already proposed the set-status of `batch`.
    fn was_set_status_proposed(
        &self,
        batch: &TransferBatch,
    ) -> impl Future<Output = ClientResult<bool>> + Send;

    /// Proposes writing the statuses of `batch`, returning the transaction hash.
    fn propose_set_status(
        &self,
        batch: &TransferBatch,
    ) -> impl Future<Output = ClientResult<String>> + Send;

    /// Returns `true` if this relayer already signed `action_id`.
    fn was_signed(&self, action_id: ActionId) -> impl Future<Output = ClientResult<bool>> + Send;

    /// Signs `action_id`, returning the transaction hash.
    fn sign(&self, action_id: ActionId) -> impl Future<Output = ClientResult<String>> + Send;

    /// Returns `true` if enough relayers signed `action_id`.
    fn quorum_reached(&self, action_id: ActionId)
        -> impl Future<Output = ClientResult<bool>> + Send;

    /// Returns `true` if `action_id` was already performed.
    fn was_executed(&self, action_id: ActionId) -> impl Future<Output = ClientResult<bool>> + Send;

    /// Performs `action_id`, returning the transaction hash.
    fn perform_action(
        &self,
        action_id: ActionId,
        batch: &TransferBatch,
    ) -> impl Future<Output = ClientResult<String>> + Send;

    /// Returns the per-deposit statuses of `batch_id` as recorded on this chain.
    fn get_transactions_statuses(
        &self,
        batch_id: BatchId,
    ) -> impl Future<Output = ClientResult<Vec<u8>>> + Send;

    /// The number of quorum polls allowed before a cycle is abandoned.
    fn max_retries_on_quorum_reached(&self) -> u64;

    /// Checks that the node behind this client is usable.
    fn check_client_availability(&self) -> impl Future<Output = ClientResult<()>> + Send;

    /// Releases the resources held by the client.
    fn close(&self) -> impl Future<Output = ClientResult<()>> + Send;
}

/// Client of the signature-based chain.
pub trait DestinationChainClient: Send + Sync {
    /// Returns the batch with id `nonce`, if the chain knows it.
    fn get_batch(
        &self,
        nonce: BatchId,
    ) -> impl Future<Output = ClientResult<Option<TransferBatch>>> + Send;

    /// Returns `true` if the batch was already executed on this chain.
    fn was_executed(&self, batch_id: BatchId) -> impl Future<Output = ClientResult<bool>> + Send;

    /// Computes the hash relayers sign to approve the transfer of `batch`.
    fn generate_message_hash(&self, batch: &TransferBatch) -> ClientResult<MessageHash>;

    /// Signs `hash` and gossips the signature to the other relayers.
    fn broadcast_signature_for_message_hash(&self, hash: MessageHash);

    /// Executes the transfer of `batch` with the gathered signatures, returning the transaction
    /// hash.
    fn execute_transfer(
        &self,
        hash: MessageHash,
        batch: &TransferBatch,
        quorum: u64,
    ) -> impl Future<Output = ClientResult<String>> + Send;

    /// Returns the number of signatures needed to execute a transfer.
    fn get_quorum_size(&self) -> impl Future<Output = ClientResult<u64>> + Send;

    /// Returns `true` if enough signatures were gathered for `hash`.
    fn is_quorum_reached(&self, hash: MessageHash)
        -> impl Future<Output = ClientResult<bool>> + Send;

    /// Returns the per-deposit statuses of `batch_id` once execution is final.
    ///
    /// An empty result means the statuses are not final yet.
    fn get_transactions_statuses(
        &self,
        batch_id: BatchId,
    ) -> impl Future<Output = ClientResult<Vec<u8>>> + Send;

    /// The number of quorum polls allowed before a cycle is abandoned.
    fn max_retries_on_quorum_reached(&self) -> u64;

    /// Checks that the node behind this client is usable.
    fn check_client_availability(&self) -> impl Future<Output = ClientResult<()>> + Send;
}
