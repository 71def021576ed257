//! Deterministic, time-windowed leader election over a sorted set of relayer keys.
//!
//! Every relayer evaluates the same pure function of wall-clock time and the agreed key list,
//! so relayers agree on the current leader without exchanging any message.

pub mod errors;
pub mod handler;
pub mod keys;
pub mod selector;
pub mod timer;

pub use errors::TopologyError;
pub use handler::{LeaderSelection, TopologyHandler, TopologyHandlerBuilder, TopologyProvider};
pub use keys::{SortedPublicKeysProvider, StaticKeysProvider};
pub use selector::select_index;
pub use timer::{ManualTimer, SystemTimer, Timer};
