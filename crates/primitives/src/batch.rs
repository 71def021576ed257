//! Transfer batches and the invariants enforced on them.

use std::fmt;

use tracing::{debug, warn};

use crate::{
    deposit::DepositTransfer,
    errors::{BatchError, BatchResult},
    status::DepositStatus,
    types::{BatchId, DepositNonce},
};

/// A numbered group of deposits moved together between the two chains.
///
/// Statuses are positional: `statuses[i]` is the status of `deposits[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBatch {
    id: BatchId,
    deposits: Vec<DepositTransfer>,
    statuses: Vec<u8>,
}

impl TransferBatch {
    /// Creates a batch whose deposits have no status recorded yet.
    pub fn new(id: BatchId, deposits: Vec<DepositTransfer>) -> Self {
        let statuses = vec![DepositStatus::None.as_byte(); deposits.len()];

        Self {
            id,
            deposits,
            statuses,
        }
    }

    /// Creates a batch with the statuses reported by a chain.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::StatusCountMismatch`] if there is not exactly one status per deposit.
    pub fn with_statuses(
        id: BatchId,
        deposits: Vec<DepositTransfer>,
        statuses: Vec<u8>,
    ) -> BatchResult<Self> {
        if deposits.len() != statuses.len() {
            return Err(BatchError::StatusCountMismatch {
                deposits: deposits.len(),
                statuses: statuses.len(),
            });
        }

        Ok(Self {
            id,
            deposits,
            statuses,
        })
    }

    /// The chain-assigned batch identifier.
    pub const fn id(&self) -> BatchId {
        self.id
    }

    /// The deposits of this batch, in on-chain order.
    pub fn deposits(&self) -> &[DepositTransfer] {
        &self.deposits
    }

    /// Mutable access to the deposits, used by clients to fill in derived fields.
    pub fn deposits_mut(&mut self) -> &mut [DepositTransfer] {
        &mut self.deposits
    }

    /// The raw status bytes of this batch.
    pub fn statuses(&self) -> &[u8] {
        &self.statuses
    }

    /// Replaces the statuses with the ones reported after execution.
    ///
    /// The new statuses may temporarily disagree in length with the deposits; callers reconcile
    /// them through [`Self::resolve_new_deposits`].
    pub fn set_statuses(&mut self, statuses: Vec<u8>) {
        self.statuses = statuses;
    }

    /// Counts the statuses equal to `status`.
    pub fn count_statuses(&self, status: DepositStatus) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == status.as_byte())
            .count()
    }

    /// Checks that the deposit nonces continue the sequence ending at `last_executed_nonce`.
    ///
    /// The first deposit must carry `last_executed_nonce + 1` and every following deposit the
    /// successor of its predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::NonceGap`] for the first deposit that breaks the sequence.
    pub fn verify_deposit_nonces(&self, last_executed_nonce: DepositNonce) -> BatchResult<()> {
        let mut expected = last_executed_nonce;

        for (index, deposit) in self.deposits.iter().enumerate() {
            expected = expected
                .checked_add(1)
                .ok_or(BatchError::NonceOverflow(expected))?;

            if deposit.nonce != expected {
                return Err(BatchError::NonceGap {
                    index,
                    found: deposit.nonce,
                    expected,
                });
            }
        }

        Ok(())
    }

    /// Reconciles the statuses against the number of deposits seen by the other chain.
    ///
    /// Statuses past `num_deposits` are marked [`DepositStatus::Rejected`] and, if
    /// `num_deposits` exceeds the current length, [`DepositStatus::Rejected`] statuses are
    /// appended until the lengths match. Existing statuses are never dropped.
    pub fn resolve_new_deposits(&mut self, num_deposits: usize) {
        let old_len = self.statuses.len();
        if num_deposits == old_len {
            debug!(batch_id = %self.id, len_statuses = %old_len, "num statuses ok");
            return;
        }

        let rejected = DepositStatus::Rejected.as_byte();
        for status in self.statuses.iter_mut().skip(num_deposits) {
            *status = rejected;
        }

        if num_deposits > old_len {
            self.statuses.resize(num_deposits, rejected);
        }

        warn!(
            batch_id = %self.id,
            len_statuses = %old_len,
            new_num_deposits = %num_deposits,
            "recovered num statuses"
        );
    }
}

impl fmt::Display for TransferBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Batch id {}:", self.id)?;
        for deposit in &self.deposits {
            write!(f, "\n  {deposit}")?;
        }

        write!(f, "\nStatuses: {}", hex::encode(&self.statuses))
    }
}

#[cfg(test)]
mod tests {
    use ethnum::U256;
    use proptest::prelude::*;

    use super::*;
    use crate::test_utils::batch_with_nonces;

    const EXECUTED: u8 = DepositStatus::Executed.as_byte();
    const REJECTED: u8 = DepositStatus::Rejected.as_byte();

    fn two_deposit_batch() -> TransferBatch {
        TransferBatch::with_statuses(
            1,
            vec![
                DepositTransfer::new(1, U256::new(10)),
                DepositTransfer::new(2, U256::new(20)),
            ],
            vec![EXECUTED, EXECUTED],
        )
        .expect("lengths match")
    }

    #[test]
    fn test_with_statuses_rejects_mismatched_lengths() {
        let result =
            TransferBatch::with_statuses(1, vec![DepositTransfer::new(1, U256::ONE)], vec![]);

        assert_eq!(
            result,
            Err(BatchError::StatusCountMismatch {
                deposits: 1,
                statuses: 0
            })
        );
    }

    #[test]
    fn test_verify_contiguous_nonces() {
        let batch = batch_with_nonces(7, &[11, 12, 13]);

        assert!(batch.verify_deposit_nonces(10).is_ok());
    }

    #[test]
    fn test_verify_rejects_already_executed_nonce() {
        let batch = batch_with_nonces(7, &[10, 11]);

        assert_eq!(
            batch.verify_deposit_nonces(10),
            Err(BatchError::NonceGap {
                index: 0,
                found: 10,
                expected: 11
            })
        );
    }

    #[test]
    fn test_verify_rejects_gap() {
        let batch = batch_with_nonces(7, &[11, 13]);

        let err = batch.verify_deposit_nonces(10).unwrap_err();
        assert_eq!(
            err,
            BatchError::NonceGap {
                index: 1,
                found: 13,
                expected: 12
            }
        );
        assert!(err.to_string().contains("found 13"));
    }

    #[test]
    fn test_verify_empty_batch() {
        let batch = batch_with_nonces(7, &[]);

        assert!(batch.verify_deposit_nonces(u64::MAX).is_ok());
    }

    #[test]
    fn test_verify_overflow() {
        let batch = batch_with_nonces(7, &[0]);

        assert_eq!(
            batch.verify_deposit_nonces(u64::MAX),
            Err(BatchError::NonceOverflow(u64::MAX))
        );
    }

    #[test]
    fn test_resolve_same_count_is_noop() {
        let mut batch = two_deposit_batch();
        batch.resolve_new_deposits(2);

        assert_eq!(batch.statuses(), &[EXECUTED, EXECUTED]);
    }

    #[test]
    fn test_resolve_zero_deposits_rejects_all() {
        let mut batch = two_deposit_batch();
        batch.resolve_new_deposits(0);

        assert_eq!(batch.statuses(), &[REJECTED, REJECTED]);
    }

    #[test]
    fn test_resolve_fewer_deposits_rejects_tail() {
        let mut batch = two_deposit_batch();
        batch.resolve_new_deposits(1);

        assert_eq!(batch.statuses(), &[EXECUTED, REJECTED]);
    }

    #[test]
    fn test_resolve_more_deposits_pads_with_rejected() {
        let mut batch = two_deposit_batch();
        batch.resolve_new_deposits(3);

        assert_eq!(batch.statuses(), &[EXECUTED, EXECUTED, REJECTED]);
    }

    #[test]
    fn test_display() {
        let batch = two_deposit_batch();
        let displayed = batch.to_string();

        assert!(displayed.starts_with("Batch id 1:"));
        assert!(displayed.contains("deposit nonce: 2"));
        assert!(displayed.ends_with("Statuses: 0303"));
    }

    #[test]
    fn test_clone_is_deep() {
        let batch = two_deposit_batch();
        let mut cloned = batch.clone();
        cloned.deposits_mut()[0].to_bytes.push(1);
        cloned.set_statuses(vec![]);

        assert_eq!(batch.statuses(), &[EXECUTED, EXECUTED]);
        assert!(batch.deposits()[0].to_bytes.is_empty());
    }

    proptest! {
        #[test]
        fn contiguous_nonces_always_verify(last in 0u64..1_000_000, len in 0usize..32) {
            let nonces: Vec<u64> = (1..=len as u64).map(|i| last + i).collect();
            let batch = batch_with_nonces(1, &nonces);

            prop_assert!(batch.verify_deposit_nonces(last).is_ok());
        }

        #[test]
        fn resolved_statuses_are_positionally_stable(
            statuses in proptest::collection::vec(0u8..5, 0..16),
            num_deposits in 0usize..24,
        ) {
            let deposits = (0..statuses.len() as u64)
                .map(|n| DepositTransfer::new(n + 1, U256::ONE))
                .collect();
            let mut batch = TransferBatch::with_statuses(1, deposits, statuses.clone()).unwrap();

            batch.resolve_new_deposits(num_deposits);

            prop_assert_eq!(batch.statuses().len(), statuses.len().max(num_deposits));
            for (i, status) in batch.statuses().iter().enumerate() {
                if i < num_deposits && i < statuses.len() {
                    prop_assert_eq!(*status, statuses[i]);
                } else {
                    prop_assert_eq!(*status, REJECTED);
                }
            }
        }
    }
}
