//! Narrow capability groups exposed by an executor to the steps.
//!
//! Each step graph only asks for the groups it uses, so either direction can be driven by an
//! executor (or a test double) that implements just those groups.

use std::{fmt, future::Future};

use relayer_primitives::{
    batch::TransferBatch,
    types::{ActionId, BatchId},
};

use crate::errors::ExecutorResult;

/// One of the two chains a relayer talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    /// The action-based chain.
    Source,
    /// The signature-based chain.
    Destination,
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::Source => write!(f, "source"),
            Chain::Destination => write!(f, "destination"),
        }
    }
}

/// Holds the batch and action id the current cycle works on.
pub trait BatchStore {
    /// Returns the stored batch, if any.
    fn stored_batch(&self) -> Option<&TransferBatch>;

    /// Replaces the stored batch.
    fn store_batch(&mut self, batch: TransferBatch);

    /// Returns the stored action id.
    fn stored_action_id(&self) -> ActionId;

    /// Replaces the statuses of the stored batch.
    fn set_stored_batch_statuses(&mut self, statuses: Vec<u8>) -> ExecutorResult<()>;

    /// Drops the batch, action id and message hash of the previous cycle.
    fn clear_cycle_state(&mut self);
}

/// Tells whether this relayer leads the current time window.
pub trait LeaderElection {
    /// Returns `true` if this relayer may submit mutating transactions right now.
    fn my_turn_as_leader(&self) -> bool;
}

/// Reads batches from the chains.
pub trait BatchFetcher {
    /// Fetches the batch pending on the source chain.
    fn get_batch_from_source(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<Option<TransferBatch>>> + Send;

    /// Fetches the id of the last destination batch executed on the source chain.
    fn get_last_executed_batch_id_from_source(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<BatchId>> + Send;

    /// Fetches the destination batch with id `nonce` and stores it.
    fn get_and_store_batch_from_destination(
        &mut self,
        nonce: BatchId,
    ) -> impl Future<Output = ExecutorResult<()>> + Send;

    /// Checks the stored batch against the last deposit nonce executed on the source chain.
    fn verify_last_deposit_nonce_executed_on_source(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<()>> + Send;
}

/// Drives proposals and signatures of actions on the source chain.
pub trait ActionProposer {
    /// Fetches and stores the action id of the transfer proposal for the stored batch.
    fn get_and_store_action_id_for_propose_transfer(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<ActionId>> + Send;

    /// Fetches and stores the action id of the set-status proposal for the stored batch.
    fn get_and_store_action_id_for_propose_set_status(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<ActionId>> + Send;

    /// Returns `true` if the transfer of the stored batch was proposed.
    fn was_transfer_proposed_on_source(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<bool>> + Send;

    /// Proposes the transfer of the stored batch.
    fn propose_transfer_on_source(&mut self) -> impl Future<Output = ExecutorResult<()>> + Send;

    /// Returns `true` if the set-status of the stored batch was proposed.
    fn was_set_status_proposed_on_source(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<bool>> + Send;

    /// Proposes the set-status of the stored batch.
    fn propose_set_status_on_source(&mut self) -> impl Future<Output = ExecutorResult<()>> + Send;

    /// Returns `true` if this relayer signed the stored action id.
    fn was_action_signed_on_source(&mut self) -> impl Future<Output = ExecutorResult<bool>> + Send;

    /// Signs the stored action id.
    fn sign_action_on_source(&mut self) -> impl Future<Output = ExecutorResult<()>> + Send;

    /// Returns `true` if the stored action id gathered a quorum.
    fn process_quorum_reached_on_source(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<bool>> + Send;

    /// Returns `true` if the stored action id was performed.
    fn was_action_performed_on_source(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<bool>> + Send;

    /// Performs the stored action id.
    fn perform_action_on_source(&mut self) -> impl Future<Output = ExecutorResult<()>> + Send;
}

/// Drives signatures and execution of transfers on the destination chain.
pub trait TransferSigner {
    /// Returns `true` if the stored batch was executed on the destination chain.
    fn was_transfer_performed_on_destination(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<bool>> + Send;

    /// Computes the message hash of the stored batch and broadcasts this relayer's signature.
    fn sign_transfer_on_destination(&mut self) -> ExecutorResult<()>;

    /// Returns `true` if enough signatures were gathered for the stored message hash.
    fn process_quorum_reached_on_destination(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<bool>> + Send;

    /// Executes the stored batch on the destination chain.
    fn perform_transfer_on_destination(&mut self)
        -> impl Future<Output = ExecutorResult<()>> + Send;
}

/// Pauses while a submitted transaction gets executed.
pub trait ConfirmationWaiter {
    /// Waits until the stored batch is observed as executed on the destination chain or the
    /// configured wait elapses.
    fn wait_for_transfer_confirmation_on_destination(&mut self)
        -> impl Future<Output = ()> + Send;

    /// Waits until the stored action id is observed as performed on the source chain or the
    /// configured wait elapses.
    fn wait_for_action_confirmation_on_source(&mut self) -> impl Future<Output = ()> + Send;
}

/// Brings the final per-deposit outcome back to where a transfer originated.
pub trait StatusResolver {
    /// Polls the destination chain until final statuses for the stored batch are available.
    ///
    /// Returns an empty vector if none became available within the configured wait.
    fn wait_and_return_final_batch_statuses(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<Vec<u8>>> + Send;

    /// Fetches the statuses of the stored batch from the destination chain.
    fn get_batch_statuses_from_destination(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<Vec<u8>>> + Send;

    /// Fetches the statuses of the stored batch from the source chain.
    fn get_batch_statuses_from_source(
        &mut self,
    ) -> impl Future<Output = ExecutorResult<Vec<u8>>> + Send;

    /// Reconciles the stored statuses with `num_deposits`.
    fn resolve_new_deposits_statuses(&mut self, num_deposits: usize) -> ExecutorResult<()>;

    /// Publishes the executed and rejected counts of the stored batch.
    fn record_batch_outcome(&mut self) -> ExecutorResult<()>;

    /// Drops the gossiped signatures of the finished transfer.
    fn clear_stored_signatures(&mut self);
}

/// Counts unsuccessful quorum polls per chain.
pub trait QuorumRetries {
    /// Returns `true` once the retry budget of `chain` is exhausted, otherwise consumes one retry
    /// and returns `false`.
    fn process_max_quorum_retries(&mut self, chain: Chain) -> bool;

    /// Resets the retry counter of `chain`.
    fn reset_quorum_retries(&mut self, chain: Chain);
}

/// Health checks and error reporting.
pub trait HealthReporter {
    /// Checks that the client of `chain` is usable.
    fn check_client_availability(
        &mut self,
        chain: Chain,
    ) -> impl Future<Output = ExecutorResult<()>> + Send;

    /// Publishes `message` as the last encountered error.
    fn set_last_error(&self, message: &str);
}

/// Everything the source-to-destination step graph needs.
pub trait SourceToDestinationExecutor:
    BatchStore
    + LeaderElection
    + BatchFetcher
    + ActionProposer
    + TransferSigner
    + ConfirmationWaiter
    + StatusResolver
    + QuorumRetries
    + HealthReporter
    + Send
{
}

impl<T> SourceToDestinationExecutor for T where
    T: BatchStore
        + LeaderElection
        + BatchFetcher
        + ActionProposer
        + TransferSigner
        + ConfirmationWaiter
        + StatusResolver
        + QuorumRetries
        + HealthReporter
        + Send
{
}

/// Everything the destination-to-source step graph needs.
pub trait DestinationToSourceExecutor:
    BatchStore
    + LeaderElection
    + BatchFetcher
    + ActionProposer
    + ConfirmationWaiter
    + StatusResolver
    + QuorumRetries
    + HealthReporter
    + Send
{
}

impl<T> DestinationToSourceExecutor for T where
    T: BatchStore
        + LeaderElection
        + BatchFetcher
        + ActionProposer
        + ConfirmationWaiter
        + StatusResolver
        + QuorumRetries
        + HealthReporter
        + Send
{
}
