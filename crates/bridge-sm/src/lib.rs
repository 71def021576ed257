//! This crate implements the step machines that move transfer batches between two chains.
//!
//! Each bridge direction is a [`steps::StepGraph`]: a closed set of named steps, driven one at a
//! time by a [`driver::StepDriver`]. Steps never touch a chain directly. They go through the
//! capability groups of [`executor::capabilities`], which [`executor::BridgeExecutor`] implements
//! on top of the chain clients of [`clients`].
//!
//! Every failure is absorbed by the steps: the error is logged, mirrored to the status handler,
//! and the cycle restarts from the initial step of the graph. Only construction can fail.

pub mod clients;
pub mod config;
pub mod driver;
pub mod errors;
pub mod executor;
pub mod signatures;
pub mod steps;

#[cfg(test)]
pub(crate) mod testing;
