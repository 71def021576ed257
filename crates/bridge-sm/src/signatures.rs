//! Signatures gossiped between relayers for the signature-based chain.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use relayer_primitives::types::MessageHash;

/// A signature over a message hash, as received from a relayer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    /// Public key of the relayer that produced the signature.
    pub public_key: Vec<u8>,
    /// The signed message hash.
    pub message_hash: MessageHash,
    /// The signature bytes.
    pub signature: Vec<u8>,
}

impl SignedMessage {
    fn unique_id(&self) -> (Vec<u8>, MessageHash) {
        (self.public_key.clone(), self.message_hash)
    }
}

/// Holds the signatures received from the gossip layer until a transfer is executed.
///
/// Shared between the gossip layer, which writes, and the destination client and executor, which
/// read and clear.
#[derive(Debug, Default)]
pub struct SignaturesHolder {
    messages: RwLock<BTreeMap<(Vec<u8>, MessageHash), SignedMessage>>,
}

impl SignaturesHolder {
    /// Creates an empty holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new signed message, replacing any earlier one from the same relayer for the same
    /// hash.
    pub fn process_new_message(&self, message: SignedMessage) {
        self.messages.write().insert(message.unique_id(), message);
    }

    /// Returns every stored message.
    pub fn all_stored_signatures(&self) -> Vec<SignedMessage> {
        self.messages.read().values().cloned().collect()
    }

    /// Returns the distinct signatures gathered for `hash`.
    pub fn signatures(&self, hash: &MessageHash) -> Vec<Vec<u8>> {
        self.messages
            .read()
            .values()
            .filter(|m| m.message_hash == *hash)
            .map(|m| m.signature.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Drops every stored signature.
    pub fn clear_stored_signatures(&self) {
        self.messages.write().clear();
    }
}
