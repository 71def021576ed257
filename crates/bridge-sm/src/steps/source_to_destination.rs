//! Moves batches from the action-based chain to the signature-based chain and writes the final
//! per-deposit statuses back.

use std::fmt;

use relayer_primitives::types::{BatchId, INVALID_ACTION_ID};
use tracing::{debug, info, warn};

use super::{report, Step, StepGraph};
use crate::executor::capabilities::{Chain, SourceToDestinationExecutor};

use SourceToDestinationStep::*;

/// Steps of the source-to-destination direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceToDestinationStep {
    /// Fetch the batch pending on the source chain.
    GettingPendingBatch,
    /// Sign the transfer message hash and gossip the signature.
    SigningProposedTransfer,
    /// Poll until enough signatures were gathered.
    WaitingForQuorumOnTransfer,
    /// Execute the transfer on the destination chain if leader.
    PerformingTransfer,
    /// Wait for the transfer to be observed as executed.
    WaitingTransferConfirmation,
    /// Fetch the final statuses of the executed transfer.
    ResolvingSetStatus,
    /// Propose writing the statuses on the source chain if leader.
    ProposingSetStatus,
    /// Sign the set-status action.
    SigningProposedSetStatus,
    /// Poll until the set-status action gathered a quorum.
    WaitingForQuorumOnSetStatus,
    /// Perform the set-status action if leader.
    PerformingSetStatus,
    /// Wait for the set-status action to be observed as performed.
    WaitingSetStatusConfirmation,
}

impl Step for SourceToDestinationStep {
    const ALL: &'static [Self] = &[
        Self::GettingPendingBatch,
        Self::SigningProposedTransfer,
        Self::WaitingForQuorumOnTransfer,
        Self::PerformingTransfer,
        Self::WaitingTransferConfirmation,
        Self::ResolvingSetStatus,
        Self::ProposingSetStatus,
        Self::SigningProposedSetStatus,
        Self::WaitingForQuorumOnSetStatus,
        Self::PerformingSetStatus,
        Self::WaitingSetStatusConfirmation,
    ];

    fn identifier(&self) -> &'static str {
        match self {
            Self::GettingPendingBatch => "get pending batch",
            Self::SigningProposedTransfer => "sign proposed transfer",
            Self::WaitingForQuorumOnTransfer => "wait for quorum on transfer",
            Self::PerformingTransfer => "perform transfer",
            Self::WaitingTransferConfirmation => "wait transfer confirmation",
            Self::ResolvingSetStatus => "resolve set status",
            Self::ProposingSetStatus => "propose set status",
            Self::SigningProposedSetStatus => "sign proposed set status",
            Self::WaitingForQuorumOnSetStatus => "wait for quorum on set status",
            Self::PerformingSetStatus => "perform set status",
            Self::WaitingSetStatusConfirmation => "wait set status confirmation",
        }
    }
}

impl fmt::Display for SourceToDestinationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// The source-to-destination step graph.
#[derive(Debug)]
pub struct SourceToDestination<E> {
    executor: E,
}

impl<E: SourceToDestinationExecutor> SourceToDestination<E> {
    /// Creates the graph on top of `executor`.
    pub const fn new(executor: E) -> Self {
        Self { executor }
    }

    /// The executor the steps run against.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Mutable access to the executor.
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    fn batch_id(&self) -> Option<BatchId> {
        self.executor.stored_batch().map(|batch| batch.id())
    }

    async fn get_pending_batch(&mut self) -> SourceToDestinationStep {
        for chain in [Chain::Source, Chain::Destination] {
            if let Err(err) = self.executor.check_client_availability(chain).await {
                debug!(%chain, %err, "client unavailable");
            }
        }
        self.executor.reset_quorum_retries(Chain::Source);
        self.executor.reset_quorum_retries(Chain::Destination);
        self.executor.clear_cycle_state();

        let batch = match self.executor.get_batch_from_source().await {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                debug!("no new batch found on source");
                return GettingPendingBatch;
            }
            Err(err) => {
                report(
                    &self.executor,
                    GettingPendingBatch.identifier(),
                    "error fetching source batch",
                    &err,
                );
                return GettingPendingBatch;
            }
        };

        let batch_id = batch.id();
        info!(%batch_id, %batch, "fetched new batch from source");
        self.executor.store_batch(batch);

        match self.executor.was_transfer_performed_on_destination().await {
            Ok(true) => {
                info!(%batch_id, "transfer already performed on destination");
                ResolvingSetStatus
            }
            Ok(false) => SigningProposedTransfer,
            Err(err) => {
                report(
                    &self.executor,
                    GettingPendingBatch.identifier(),
                    "error determining if transfer was performed",
                    &err,
                );
                GettingPendingBatch
            }
        }
    }

    fn sign_proposed_transfer(&mut self) -> SourceToDestinationStep {
        let Some(batch_id) = self.batch_id() else {
            debug!("nil batch stored");
            return GettingPendingBatch;
        };

        if let Err(err) = self.executor.sign_transfer_on_destination() {
            report(
                &self.executor,
                SigningProposedTransfer.identifier(),
                "error signing transfer",
                &err,
            );
            return GettingPendingBatch;
        }

        debug!(%batch_id, "signed proposed transfer");
        WaitingForQuorumOnTransfer
    }

    async fn wait_for_quorum_on_transfer(&mut self) -> SourceToDestinationStep {
        if self.executor.process_max_quorum_retries(Chain::Destination) {
            self.warn_max_retries(WaitingForQuorumOnTransfer);
            return GettingPendingBatch;
        }

        match self.executor.process_quorum_reached_on_destination().await {
            Ok(true) => {
                info!(batch_id = ?self.batch_id(), "quorum reached on transfer");
                self.executor.reset_quorum_retries(Chain::Destination);
                PerformingTransfer
            }
            Ok(false) => WaitingForQuorumOnTransfer,
            Err(err) => {
                report(
                    &self.executor,
                    WaitingForQuorumOnTransfer.identifier(),
                    "error while checking the quorum on destination",
                    &err,
                );
                GettingPendingBatch
            }
        }
    }

    async fn perform_transfer(&mut self) -> SourceToDestinationStep {
        match self.executor.was_transfer_performed_on_destination().await {
            Ok(true) => {
                info!(batch_id = ?self.batch_id(), "transfer performed on destination");
                return ResolvingSetStatus;
            }
            Ok(false) => {}
            Err(err) => {
                report(
                    &self.executor,
                    PerformingTransfer.identifier(),
                    "error determining if transfer was performed",
                    &err,
                );
                return GettingPendingBatch;
            }
        }

        if !self.executor.my_turn_as_leader() {
            debug!("not my turn as leader in this round");
            return PerformingTransfer;
        }

        if let Err(err) = self.executor.perform_transfer_on_destination().await {
            report(
                &self.executor,
                PerformingTransfer.identifier(),
                "error performing transfer",
                &err,
            );
            return GettingPendingBatch;
        }

        WaitingTransferConfirmation
    }

    async fn resolve_set_status(&mut self) -> SourceToDestinationStep {
        self.executor.clear_stored_signatures();

        let Some(batch_id) = self.batch_id() else {
            debug!("nil batch stored");
            return GettingPendingBatch;
        };

        let fetched = match self.executor.get_batch_from_source().await {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                debug!(%batch_id, "batch no longer pending on source");
                return GettingPendingBatch;
            }
            Err(err) => {
                report(
                    &self.executor,
                    ResolvingSetStatus.identifier(),
                    "error fetching source batch",
                    &err,
                );
                return GettingPendingBatch;
            }
        };

        let statuses = match self.executor.wait_and_return_final_batch_statuses().await {
            Ok(statuses) if statuses.is_empty() => {
                debug!(%batch_id, "final statuses not available yet");
                return GettingPendingBatch;
            }
            Ok(statuses) => statuses,
            Err(err) => {
                report(
                    &self.executor,
                    ResolvingSetStatus.identifier(),
                    "error fetching final batch statuses",
                    &err,
                );
                return GettingPendingBatch;
            }
        };

        let resolved = self
            .executor
            .set_stored_batch_statuses(statuses)
            .and_then(|()| {
                self.executor
                    .resolve_new_deposits_statuses(fetched.deposits().len())
            });
        if let Err(err) = resolved {
            report(
                &self.executor,
                ResolvingSetStatus.identifier(),
                "error resolving batch statuses",
                &err,
            );
            return GettingPendingBatch;
        }

        ProposingSetStatus
    }

    async fn propose_set_status(&mut self) -> SourceToDestinationStep {
        let Some(batch_id) = self.batch_id() else {
            debug!("nil batch stored");
            return GettingPendingBatch;
        };

        match self.executor.was_set_status_proposed_on_source().await {
            Ok(true) => return SigningProposedSetStatus,
            Ok(false) => {}
            Err(err) => {
                report(
                    &self.executor,
                    ProposingSetStatus.identifier(),
                    "error determining if set status was proposed",
                    &err,
                );
                return GettingPendingBatch;
            }
        }

        if !self.executor.my_turn_as_leader() {
            debug!("not my turn as leader in this round");
            return ProposingSetStatus;
        }

        if let Err(err) = self.executor.propose_set_status_on_source().await {
            report(
                &self.executor,
                ProposingSetStatus.identifier(),
                "error proposing set status",
                &err,
            );
            return GettingPendingBatch;
        }

        info!(%batch_id, "proposed set status");
        SigningProposedSetStatus
    }

    async fn sign_proposed_set_status(&mut self) -> SourceToDestinationStep {
        let action_id = match self
            .executor
            .get_and_store_action_id_for_propose_set_status()
            .await
        {
            Ok(action_id) => action_id,
            Err(err) => {
                report(
                    &self.executor,
                    SigningProposedSetStatus.identifier(),
                    "error fetching action ID",
                    &err,
                );
                return GettingPendingBatch;
            }
        };

        if action_id == INVALID_ACTION_ID {
            warn!(batch_id = ?self.batch_id(), "contract error, got invalid action ID");
            self.executor
                .set_last_error("contract error, got invalid action ID");
            return GettingPendingBatch;
        }

        match self.executor.was_action_signed_on_source().await {
            Ok(true) => return WaitingForQuorumOnSetStatus,
            Ok(false) => {}
            Err(err) => {
                report(
                    &self.executor,
                    SigningProposedSetStatus.identifier(),
                    "error determining if the set status action was signed",
                    &err,
                );
                return GettingPendingBatch;
            }
        }

        if let Err(err) = self.executor.sign_action_on_source().await {
            report(
                &self.executor,
                SigningProposedSetStatus.identifier(),
                "error signing the set status action",
                &err,
            );
            return GettingPendingBatch;
        }

        WaitingForQuorumOnSetStatus
    }

    async fn wait_for_quorum_on_set_status(&mut self) -> SourceToDestinationStep {
        if self.executor.process_max_quorum_retries(Chain::Source) {
            self.warn_max_retries(WaitingForQuorumOnSetStatus);
            return GettingPendingBatch;
        }

        match self.executor.process_quorum_reached_on_source().await {
            Ok(true) => {
                info!(
                    batch_id = ?self.batch_id(),
                    action_id = %self.executor.stored_action_id(),
                    "quorum reached on set status"
                );
                self.executor.reset_quorum_retries(Chain::Source);
                PerformingSetStatus
            }
            Ok(false) => WaitingForQuorumOnSetStatus,
            Err(err) => {
                report(
                    &self.executor,
                    WaitingForQuorumOnSetStatus.identifier(),
                    "error while checking the quorum on source",
                    &err,
                );
                GettingPendingBatch
            }
        }
    }

    async fn perform_set_status(&mut self) -> SourceToDestinationStep {
        match self.executor.was_action_performed_on_source().await {
            Ok(true) => {
                if let Err(err) = self.executor.record_batch_outcome() {
                    report(
                        &self.executor,
                        PerformingSetStatus.identifier(),
                        "error recording batch outcome",
                        &err,
                    );
                }
                info!(batch_id = ?self.batch_id(), "set status performed, batch finished");
                return GettingPendingBatch;
            }
            Ok(false) => {}
            Err(err) => {
                report(
                    &self.executor,
                    PerformingSetStatus.identifier(),
                    "error determining if the set status action was performed",
                    &err,
                );
                return GettingPendingBatch;
            }
        }

        if !self.executor.my_turn_as_leader() {
            debug!("not my turn as leader in this round");
            return PerformingSetStatus;
        }

        if let Err(err) = self.executor.perform_action_on_source().await {
            report(
                &self.executor,
                PerformingSetStatus.identifier(),
                "error performing the set status action",
                &err,
            );
            return GettingPendingBatch;
        }

        WaitingSetStatusConfirmation
    }

    fn warn_max_retries(&self, step: SourceToDestinationStep) {
        warn!(
            %step,
            batch_id = ?self.batch_id(),
            "max number of retries reached, resetting to the initial step"
        );
        self.executor
            .set_last_error(&format!("{step}: max number of retries reached"));
    }
}

impl<E: SourceToDestinationExecutor> StepGraph for SourceToDestination<E> {
    type Step = SourceToDestinationStep;

    fn initial_step(&self) -> Self::Step {
        GettingPendingBatch
    }

    async fn execute(&mut self, step: Self::Step) -> Self::Step {
        match step {
            GettingPendingBatch => self.get_pending_batch().await,
            SigningProposedTransfer => self.sign_proposed_transfer(),
            WaitingForQuorumOnTransfer => self.wait_for_quorum_on_transfer().await,
            PerformingTransfer => self.perform_transfer().await,
            WaitingTransferConfirmation => {
                self.executor
                    .wait_for_transfer_confirmation_on_destination()
                    .await;
                PerformingTransfer
            }
            ResolvingSetStatus => self.resolve_set_status().await,
            ProposingSetStatus => self.propose_set_status().await,
            SigningProposedSetStatus => self.sign_proposed_set_status().await,
            WaitingForQuorumOnSetStatus => self.wait_for_quorum_on_set_status().await,
            PerformingSetStatus => self.perform_set_status().await,
            WaitingSetStatusConfirmation => {
                self.executor.wait_for_action_confirmation_on_source().await;
                PerformingSetStatus
            }
        }
    }
}
