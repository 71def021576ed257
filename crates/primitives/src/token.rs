//! Resolution of destination-chain token identifiers.

use std::{collections::HashMap, future::Future};

use crate::batch::TransferBatch;

/// Maps a token identifier on the chain a deposit comes from to the identifier of the same asset
/// on the chain it is moving to.
pub trait TokenMapper {
    /// The error returned when a token cannot be mapped.
    type Error;

    /// Converts a source token identifier into the destination token identifier.
    fn convert_token(
        &self,
        source_token: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;
}

/// Fills in [`destination_token_bytes`](crate::deposit::DepositTransfer::destination_token_bytes)
/// for every deposit in the batch.
///
/// The mapper is queried once per distinct source token; deposits sharing a source token reuse
/// the cached result.
pub async fn resolve_destination_tokens<M>(
    batch: &mut TransferBatch,
    mapper: &M,
) -> Result<(), M::Error>
where
    M: TokenMapper + Sync,
{
    let mut cache: HashMap<Vec<u8>, Vec<u8>> = HashMap::new();

    for deposit in batch.deposits_mut() {
        let destination = match cache.get(&deposit.source_token_bytes) {
            Some(converted) => converted.clone(),
            None => {
                let converted = mapper.convert_token(&deposit.source_token_bytes).await?;
                cache.insert(deposit.source_token_bytes.clone(), converted.clone());
                converted
            }
        };

        deposit.destination_token_bytes = destination;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ethnum::U256;

    use super::*;
    use crate::deposit::DepositTransfer;

    #[derive(Debug, Default)]
    struct CountingMapper {
        calls: AtomicUsize,
    }

    impl TokenMapper for CountingMapper {
        type Error = String;

        async fn convert_token(&self, source_token: &[u8]) -> Result<Vec<u8>, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if source_token == b"unknown" {
                return Err("unknown token".to_string());
            }

            let mut converted = b"wrapped-".to_vec();
            converted.extend_from_slice(source_token);
            Ok(converted)
        }
    }

    fn deposit_with_token(nonce: u64, token: &[u8]) -> DepositTransfer {
        let mut deposit = DepositTransfer::new(nonce, U256::ONE);
        deposit.source_token_bytes = token.to_vec();
        deposit
    }

    #[tokio::test]
    async fn test_equal_tokens_resolve_once() {
        let mut batch = TransferBatch::new(
            1,
            vec![
                deposit_with_token(1, b"usdc"),
                deposit_with_token(2, b"eth"),
                deposit_with_token(3, b"usdc"),
            ],
        );
        let mapper = CountingMapper::default();

        resolve_destination_tokens(&mut batch, &mapper).await.unwrap();

        assert_eq!(mapper.calls.load(Ordering::SeqCst), 2);
        let resolved: Vec<_> = batch
            .deposits()
            .iter()
            .map(|d| d.destination_token_bytes.clone())
            .collect();
        assert_eq!(
            resolved,
            vec![
                b"wrapped-usdc".to_vec(),
                b"wrapped-eth".to_vec(),
                b"wrapped-usdc".to_vec()
            ]
        );
    }

    #[tokio::test]
    async fn test_mapping_error_propagates() {
        let mut batch = TransferBatch::new(1, vec![deposit_with_token(1, b"unknown")]);

        let result = resolve_destination_tokens(&mut batch, &CountingMapper::default()).await;

        assert_eq!(result, Err("unknown token".to_string()));
    }
}
