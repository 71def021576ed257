//! In-memory chains and helpers to run several relayers against them.
//!
//! The ledgers of [`ledger`] model the two multisig flavours the relayer talks to: an
//! action-based multisig on the source chain and a signature-based multisig on the destination
//! chain. [`clients`] implements the chain-client traits of `relayer-sm` on top of them, and
//! [`network`] wires a set of relayers together the way a deployment would.

pub mod clients;
pub mod fixtures;
pub mod ledger;
pub mod network;
pub mod timer;
