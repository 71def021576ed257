//! Chain-agnostic value types shared by every crate in the relayer workspace.
//!
//! This crate lies at the bottom of the crate-hierarchy in this workspace i.e., it does not depend
//! on any other crate in this workspace. It models transfer batches and their deposits together
//! with the invariants that the relayer state machines rely on: nonce contiguity and positional
//! alignment between deposits and their statuses.

pub mod batch;
pub mod call_data;
pub mod deposit;
pub mod errors;
pub mod status;
pub mod token;
pub mod types;

#[cfg(test)]
mod test_utils;
