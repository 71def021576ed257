//! Fixtures shared by the tests of this crate.

use std::sync::Arc;

use ethnum::U256;
use relayer_primitives::{batch::TransferBatch, deposit::DepositTransfer, types::BatchId};
use relayer_status::RelayerStatus;

/// Creates a batch with one deposit per nonce, each moving `100 * nonce` units.
pub(crate) fn test_batch(id: BatchId, nonces: &[u64]) -> TransferBatch {
    let deposits = nonces
        .iter()
        .map(|&nonce| DepositTransfer::new(nonce, U256::from(nonce * 100)))
        .collect();

    TransferBatch::new(id, deposits)
}

/// Creates an empty status handler.
pub(crate) fn test_status() -> Arc<RelayerStatus> {
    Arc::new(RelayerStatus::new("test").unwrap())
}
