use ethnum::U256;

use crate::{batch::TransferBatch, deposit::DepositTransfer, types::BatchId};

pub(crate) fn batch_with_nonces(id: BatchId, nonces: &[u64]) -> TransferBatch {
    let deposits = nonces
        .iter()
        .map(|nonce| DepositTransfer::new(*nonce, U256::new(u128::from(*nonce) * 100)))
        .collect();

    TransferBatch::new(id, deposits)
}
