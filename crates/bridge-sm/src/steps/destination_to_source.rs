//! Moves batches from the signature-based chain to the action-based chain.

use std::fmt;

use relayer_primitives::types::{BatchId, INVALID_ACTION_ID};
use tracing::{debug, info, warn};

use super::{report, Step, StepGraph};
use crate::executor::capabilities::{Chain, DestinationToSourceExecutor};

use DestinationToSourceStep::*;

/// Steps of the destination-to-source direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationToSourceStep {
    /// Fetch the next destination batch not yet executed on the source chain.
    GettingPendingBatch,
    /// Propose the transfer on the source chain if leader.
    ProposingTransfer,
    /// Sign the transfer action.
    SigningProposedTransfer,
    /// Poll until the transfer action gathered a quorum.
    WaitingForQuorumOnTransfer,
    /// Perform the transfer action if leader.
    PerformingTransfer,
    /// Wait for the transfer action to be observed as performed.
    WaitingTransferConfirmation,
}

impl Step for DestinationToSourceStep {
    const ALL: &'static [Self] = &[
        Self::GettingPendingBatch,
        Self::ProposingTransfer,
        Self::SigningProposedTransfer,
        Self::WaitingForQuorumOnTransfer,
        Self::PerformingTransfer,
        Self::WaitingTransferConfirmation,
    ];

    fn identifier(&self) -> &'static str {
        match self {
            Self::GettingPendingBatch => "get pending batch",
            Self::ProposingTransfer => "propose transfer",
            Self::SigningProposedTransfer => "sign proposed transfer",
            Self::WaitingForQuorumOnTransfer => "wait for quorum on transfer",
            Self::PerformingTransfer => "perform transfer",
            Self::WaitingTransferConfirmation => "wait transfer confirmation",
        }
    }
}

impl fmt::Display for DestinationToSourceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// The destination-to-source step graph.
#[derive(Debug)]
pub struct DestinationToSource<E> {
    executor: E,
}

impl<E: DestinationToSourceExecutor> DestinationToSource<E> {
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

    async fn get_pending_batch(&mut self) -> DestinationToSourceStep {
        for chain in [Chain::Source, Chain::Destination] {
            if let Err(err) = self.executor.check_client_availability(chain).await {
                debug!(%chain, %err, "client unavailable");
            }
        }
        self.executor.reset_quorum_retries(Chain::Source);
        self.executor.reset_quorum_retries(Chain::Destination);
        self.executor.clear_cycle_state();

        let last_executed = match self.executor.get_last_executed_batch_id_from_source().await {
            Ok(batch_id) => batch_id,
            Err(err) => {
                report(
                    &self.executor,
                    GettingPendingBatch.identifier(),
                    "error fetching last executed batch ID on source",
                    &err,
                );
                return GettingPendingBatch;
            }
        };

        let next = last_executed.saturating_add(1);
        if let Err(err) = self
            .executor
            .get_and_store_batch_from_destination(next)
            .await
        {
            debug!(batch_id = %next, %err, "cannot fetch destination batch");
            return GettingPendingBatch;
        }

        if let Some(batch) = self.executor.stored_batch() {
            info!(batch_id = %batch.id(), %batch, "fetched new batch from destination");
        }

        if let Err(err) = self
            .executor
            .verify_last_deposit_nonce_executed_on_source()
            .await
        {
            report(
                &self.executor,
                GettingPendingBatch.identifier(),
                "verification failed on the new batch from destination",
                &err,
            );
            return GettingPendingBatch;
        }

        ProposingTransfer
    }

    async fn propose_transfer(&mut self) -> DestinationToSourceStep {
        let Some(batch_id) = self.batch_id() else {
            debug!("nil batch stored");
            return GettingPendingBatch;
        };

        match self.executor.was_transfer_proposed_on_source().await {
            Ok(true) => return SigningProposedTransfer,
            Ok(false) => {}
            Err(err) => {
                report(
                    &self.executor,
                    ProposingTransfer.identifier(),
                    "error determining if the batch was proposed on source",
                    &err,
                );
                return GettingPendingBatch;
            }
        }

        if !self.executor.my_turn_as_leader() {
            debug!("not my turn as leader in this round");
            return ProposingTransfer;
        }

        if let Err(err) = self.executor.propose_transfer_on_source().await {
            report(
                &self.executor,
                ProposingTransfer.identifier(),
                "error proposing transfer on source",
                &err,
            );
            return GettingPendingBatch;
        }

        info!(%batch_id, "proposed transfer on source");
        SigningProposedTransfer
    }

    async fn sign_proposed_transfer(&mut self) -> DestinationToSourceStep {
        let action_id = match self
            .executor
            .get_and_store_action_id_for_propose_transfer()
            .await
        {
            Ok(action_id) => action_id,
            Err(err) => {
                report(
                    &self.executor,
                    SigningProposedTransfer.identifier(),
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
            Ok(true) => return WaitingForQuorumOnTransfer,
            Ok(false) => {}
            Err(err) => {
                report(
                    &self.executor,
                    SigningProposedTransfer.identifier(),
                    "error determining if the proposed transfer was signed",
                    &err,
                );
                return GettingPendingBatch;
            }
        }

        if let Err(err) = self.executor.sign_action_on_source().await {
            report(
                &self.executor,
                SigningProposedTransfer.identifier(),
                "error signing the proposed transfer",
                &err,
            );
            return GettingPendingBatch;
        }

        WaitingForQuorumOnTransfer
    }

    async fn wait_for_quorum_on_transfer(&mut self) -> DestinationToSourceStep {
        if self.executor.process_max_quorum_retries(Chain::Source) {
            warn!(
                batch_id = ?self.batch_id(),
                "max number of retries reached, resetting to the initial step"
            );
            self.executor.set_last_error(&format!(
                "{}: max number of retries reached",
                WaitingForQuorumOnTransfer
            ));
            return GettingPendingBatch;
        }

        match self.executor.process_quorum_reached_on_source().await {
            Ok(true) => {
                info!(
                    batch_id = ?self.batch_id(),
                    action_id = %self.executor.stored_action_id(),
                    "quorum reached on transfer"
                );
                self.executor.reset_quorum_retries(Chain::Source);
                PerformingTransfer
            }
            Ok(false) => WaitingForQuorumOnTransfer,
            Err(err) => {
                report(
                    &self.executor,
                    WaitingForQuorumOnTransfer.identifier(),
                    "error while checking the quorum on source",
                    &err,
                );
                GettingPendingBatch
            }
        }
    }

    async fn perform_transfer(&mut self) -> DestinationToSourceStep {
        match self.executor.was_action_performed_on_source().await {
            Ok(true) => {
                self.finish_batch().await;
                return GettingPendingBatch;
            }
            Ok(false) => {}
            Err(err) => {
                report(
                    &self.executor,
                    PerformingTransfer.identifier(),
                    "error determining if the transfer action was performed",
                    &err,
                );
                return GettingPendingBatch;
            }
        }

        if !self.executor.my_turn_as_leader() {
            debug!("not my turn as leader in this round");
            return PerformingTransfer;
        }

        if let Err(err) = self.executor.perform_action_on_source().await {
            report(
                &self.executor,
                PerformingTransfer.identifier(),
                "error performing the transfer action",
                &err,
            );
            return GettingPendingBatch;
        }

        WaitingTransferConfirmation
    }

    /// Pulls the statuses written by the performed action and publishes the batch outcome.
    async fn finish_batch(&mut self) {
        let statuses = match self.executor.get_batch_statuses_from_source().await {
            Ok(statuses) => statuses,
            Err(err) => {
                report(
                    &self.executor,
                    PerformingTransfer.identifier(),
                    "error fetching batch statuses from source",
                    &err,
                );
                return;
            }
        };

        let recorded = self
            .executor
            .set_stored_batch_statuses(statuses)
            .and_then(|()| self.executor.record_batch_outcome());
        if let Err(err) = recorded {
            report(
                &self.executor,
                PerformingTransfer.identifier(),
                "error recording batch outcome",
                &err,
            );
            return;
        }

        info!(batch_id = ?self.batch_id(), "transfer performed on source, batch finished");
    }
}

impl<E: DestinationToSourceExecutor> StepGraph for DestinationToSource<E> {
    type Step = DestinationToSourceStep;

    fn initial_step(&self) -> Self::Step {
        GettingPendingBatch
    }

    async fn execute(&mut self, step: Self::Step) -> Self::Step {
        match step {
            GettingPendingBatch => self.get_pending_batch().await,
            ProposingTransfer => self.propose_transfer().await,
            SigningProposedTransfer => self.sign_proposed_transfer().await,
            WaitingForQuorumOnTransfer => self.wait_for_quorum_on_transfer().await,
            PerformingTransfer => self.perform_transfer().await,
            WaitingTransferConfirmation => {
                self.executor.wait_for_action_confirmation_on_source().await;
                PerformingTransfer
            }
        }
    }
}
