//! Sources of the agreed participant key list.

use std::fmt;

/// Provides the list of participant public keys in a globally agreed order.
///
/// Every relayer must observe the same list in the same order, otherwise relayers disagree on
/// the current leader.
pub trait SortedPublicKeysProvider: Send + Sync + fmt::Debug {
    /// Returns the participant keys, sorted.
    fn sorted_public_keys(&self) -> Vec<Vec<u8>>;
}

/// A fixed key list, sorted lexicographically on the key bytes at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticKeysProvider {
    keys: Vec<Vec<u8>>,
}

impl StaticKeysProvider {
    /// Creates a provider from keys in any order.
    pub fn new(mut keys: Vec<Vec<u8>>) -> Self {
        keys.sort();
        keys.dedup();

        Self { keys }
    }
}

impl SortedPublicKeysProvider for StaticKeysProvider {
    fn sorted_public_keys(&self) -> Vec<Vec<u8>> {
        self.keys.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_keys_are_sorted_and_deduplicated() {
        let provider = StaticKeysProvider::new(vec![
            b"pk3".to_vec(),
            b"pk1".to_vec(),
            b"pk2".to_vec(),
            b"pk1".to_vec(),
        ]);

        assert_eq!(
            provider.sorted_public_keys(),
            vec![b"pk1".to_vec(), b"pk2".to_vec(), b"pk3".to_vec()]
        );
    }
}
