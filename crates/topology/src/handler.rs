//! Leader election for a single relayer.

use std::{fmt, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    errors::TopologyError, keys::SortedPublicKeysProvider, selector::select_index, timer::Timer,
};

/// Decides whether this relayer may submit mutating transactions right now.
pub trait TopologyProvider: Send + Sync {
    /// Returns `true` if this relayer is the leader of the current time window.
    fn my_turn_as_leader(&self) -> bool;
}

/// How the leader of a time window is derived from the window number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderSelection {
    /// `window mod num_keys`: every relayer leads in turn.
    #[default]
    RoundRobin,

    /// The window number is used as seed for [`select_index`].
    Hashed,
}

/// Time-windowed leader election over a sorted key list.
///
/// Time is cut into windows of `step_duration`; the leader of window `w` is the key at
/// `w mod len(keys)` (or [`select_index`] of `w`, see [`LeaderSelection`]). Nothing is cached:
/// the key list and the clock are read on every evaluation.
pub struct TopologyHandler {
    key_provider: Arc<dyn SortedPublicKeysProvider>,
    timer: Arc<dyn Timer>,
    step_duration: Duration,
    address: Vec<u8>,
    selection: LeaderSelection,
}

impl fmt::Debug for TopologyHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyHandler")
            .field("step_duration", &self.step_duration)
            .field("address", &hex::encode(&self.address))
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl TopologyHandler {
    /// Returns a builder for a [`TopologyHandler`].
    pub fn builder() -> TopologyHandlerBuilder {
        TopologyHandlerBuilder::default()
    }

    /// Returns the index of the current leader in the sorted key list, or `None` when the list
    /// is empty.
    pub fn leader_index(&self) -> Option<usize> {
        let num_keys = self.key_provider.sorted_public_keys().len();

        self.leader_index_for(num_keys)
    }

    fn leader_index_for(&self, num_keys: usize) -> Option<usize> {
        if num_keys == 0 {
            return None;
        }

        let window = self.timer.now_unix() / self.step_duration.as_secs();
        let index = match self.selection {
            LeaderSelection::RoundRobin => (window % num_keys as u64) as usize,
            LeaderSelection::Hashed => select_index(window, num_keys),
        };

        Some(index)
    }
}

impl TopologyProvider for TopologyHandler {
    fn my_turn_as_leader(&self) -> bool {
        let keys = self.key_provider.sorted_public_keys();

        let Some(index) = self.leader_index_for(keys.len()) else {
            return false;
        };

        let is_leader = keys[index] == self.address;
        trace!(%index, %is_leader, "evaluated leader");

        is_leader
    }
}

/// Builder for [`TopologyHandler`].
///
/// Every collaborator is mandatory; [`Self::build`] reports the first one that is missing or
/// malformed.
#[derive(Default)]
pub struct TopologyHandlerBuilder {
    key_provider: Option<Arc<dyn SortedPublicKeysProvider>>,
    timer: Option<Arc<dyn Timer>>,
    step_duration: Duration,
    address: Vec<u8>,
    selection: LeaderSelection,
}

impl fmt::Debug for TopologyHandlerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyHandlerBuilder")
            .field("has_key_provider", &self.key_provider.is_some())
            .field("has_timer", &self.timer.is_some())
            .field("step_duration", &self.step_duration)
            .field("address", &hex::encode(&self.address))
            .field("selection", &self.selection)
            .finish()
    }
}

impl TopologyHandlerBuilder {
    /// Sets the provider of the sorted participant keys.
    pub fn with_key_provider(mut self, provider: Arc<dyn SortedPublicKeysProvider>) -> Self {
        self.key_provider = Some(provider);
        self
    }

    /// Sets the clock.
    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Sets the length of a leadership window. Must be at least one second.
    pub const fn with_step_duration(mut self, step_duration: Duration) -> Self {
        self.step_duration = step_duration;
        self
    }

    /// Sets this relayer's own address, as it appears in the key list.
    pub fn with_address(mut self, address: impl Into<Vec<u8>>) -> Self {
        self.address = address.into();
        self
    }

    /// Sets the leader selection strategy. Defaults to [`LeaderSelection::RoundRobin`].
    pub const fn with_selection(mut self, selection: LeaderSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Validates the configuration and builds the handler.
    pub fn build(self) -> Result<TopologyHandler, TopologyError> {
        let key_provider = self.key_provider.ok_or(TopologyError::MissingKeyProvider)?;
        let timer = self.timer.ok_or(TopologyError::MissingTimer)?;

        if self.step_duration.as_secs() == 0 {
            return Err(TopologyError::InvalidStepDuration(self.step_duration));
        }

        if self.address.is_empty() {
            return Err(TopologyError::EmptyAddress);
        }

        Ok(TopologyHandler {
            key_provider,
            timer,
            step_duration: self.step_duration,
            address: self.address,
            selection: self.selection,
        })
    }
}
