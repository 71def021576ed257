//! Test doubles shared by the unit tests of this crate.
//!
//! - [`mock`]: a scripted executor implementing every capability group, used to test step
//!   graphs in isolation.
//! - [`clients`]: in-memory chain clients, used to test the real executor.
//! - [`fixtures`]: batches and status handlers.

pub(crate) mod clients;
pub(crate) mod fixtures;
pub(crate) mod mock;
