//! Identifier types used across the relayer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chain-assigned identifier of a transfer batch.
pub type BatchId = u64;

/// Chain-global ordering key of a deposit.
pub type DepositNonce = u64;

/// Identifier of a pending multisig action on the action-based chain.
pub type ActionId = u64;

/// The action id returned by the chain when no action matches the query.
pub const INVALID_ACTION_ID: ActionId = 0;

/// Hash of the message that relayers sign on the signature-based chain.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageHash([u8; 32]);

impl MessageHash {
    /// Returns the raw bytes of the hash.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns `true` if every byte of the hash is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl From<[u8; 32]> for MessageHash {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl fmt::Display for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageHash({self})")
    }
}
