//! Randomized deposits and relayer identities.

use ethnum::U256;
use rand::{seq::SliceRandom, Rng};
use relayer_primitives::{deposit::DepositTransfer, types::DepositNonce};

use crate::clients::StaticTokenMapper;

/// Tokens issued on the source chain.
pub const SOURCE_TOKENS: [&[u8]; 2] = [b"SRC-USDC", b"SRC-WETH"];

/// The destination-chain counterparts of [`SOURCE_TOKENS`], in the same order.
pub const DESTINATION_TOKENS: [&[u8]; 2] = [b"DST-USDC", b"DST-WETH"];

/// Maps every source token to its destination counterpart.
pub fn token_mapper() -> StaticTokenMapper {
    StaticTokenMapper::new(
        SOURCE_TOKENS
            .iter()
            .zip(DESTINATION_TOKENS.iter())
            .map(|(source, destination)| (source.to_vec(), destination.to_vec())),
    )
}

/// Public keys of `n` relayers.
pub fn relayer_keys(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("relayer-{i:02}").into_bytes()).collect()
}

/// Generates `count` deposits with consecutive nonces starting at `first_nonce`, each moving a
/// random non-zero amount of one of `tokens`.
pub fn random_deposits<R: Rng>(
    rng: &mut R,
    first_nonce: DepositNonce,
    count: usize,
    tokens: &[&[u8]],
) -> Vec<DepositTransfer> {
    (first_nonce..)
        .take(count)
        .map(|nonce| {
            let mut deposit = DepositTransfer::new(nonce, U256::from(rng.gen_range(1..=1_000_000u64)));

            let to: [u8; 20] = rng.gen();
            let from: [u8; 20] = rng.gen();
            deposit.displayable_to = hex::encode(to);
            deposit.displayable_from = hex::encode(from);
            deposit.to_bytes = to.to_vec();
            deposit.from_bytes = from.to_vec();

            let token = tokens.choose(rng).copied().unwrap_or_default();
            deposit.source_token_bytes = token.to_vec();
            deposit.displayable_token = String::from_utf8_lossy(token).into_owned();

            deposit
        })
        .collect()
}
