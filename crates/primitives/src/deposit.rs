//! A single transfer instruction carried by a batch.

use std::fmt;

use ethnum::U256;

use crate::{
    call_data::{self, MISSING_DATA_MARKER},
    errors::CallDataError,
    types::DepositNonce,
};

/// One asset transfer instruction within a [`TransferBatch`](crate::batch::TransferBatch).
///
/// Raw byte fields are authoritative. The `displayable_*` fields are derived by the chain clients
/// for logging and are never used to build transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositTransfer {
    /// Strictly increasing, chain-global ordering key.
    pub nonce: DepositNonce,

    /// Recipient address on the chain the deposit is moving to.
    pub to_bytes: Vec<u8>,

    /// Human-readable form of [`Self::to_bytes`].
    pub displayable_to: String,

    /// Sender address on the chain the deposit originated from.
    pub from_bytes: Vec<u8>,

    /// Human-readable form of [`Self::from_bytes`].
    pub displayable_from: String,

    /// Token identifier on the chain the deposit originated from.
    pub source_token_bytes: Vec<u8>,

    /// Token identifier on the chain the deposit is moving to.
    ///
    /// Resolved lazily through a [`TokenMapper`](crate::token::TokenMapper).
    pub destination_token_bytes: Vec<u8>,

    /// Human-readable form of the source token.
    pub displayable_token: String,

    /// Transferred amount.
    pub amount: U256,

    /// Opaque payload for smart-contract calls on the receiving chain.
    ///
    /// Always starts with a protocol marker; a lone [`MISSING_DATA_MARKER`] means "no call".
    pub data: Vec<u8>,

    /// Human-readable form of [`Self::data`].
    pub displayable_data: String,

    /// Gas added on top of the regular transfer cost when executing the call.
    pub extra_gas_limit: u64,
}

impl DepositTransfer {
    /// Creates a plain transfer without any smart-contract call attached.
    pub fn new(nonce: DepositNonce, amount: U256) -> Self {
        Self {
            nonce,
            to_bytes: Vec::new(),
            displayable_to: String::new(),
            from_bytes: Vec::new(),
            displayable_from: String::new(),
            source_token_bytes: Vec::new(),
            destination_token_bytes: Vec::new(),
            displayable_token: String::new(),
            amount,
            data: vec![MISSING_DATA_MARKER],
            displayable_data: String::new(),
            extra_gas_limit: 0,
        }
    }

    /// Returns `true` if a smart-contract call is attached to this deposit.
    pub fn has_call_data(&self) -> bool {
        self.data.first().is_some_and(|marker| *marker != MISSING_DATA_MARKER)
    }

    /// Decodes [`Self::data`] and stores the result in [`Self::displayable_data`].
    pub fn refresh_displayable_data(&mut self) -> Result<(), CallDataError> {
        self.displayable_data = call_data::to_displayable(&self.data)?;

        Ok(())
    }
}

impl fmt::Display for DepositTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "to: {}, from: {}, token address: {}, amount: {}, deposit nonce: {}",
            self.displayable_to, self.displayable_from, self.displayable_token, self.amount, self.nonce
        )?;

        if !self.displayable_data.is_empty() {
            write!(f, ", data: {}", self.displayable_data)?;
        }

        Ok(())
    }
}
