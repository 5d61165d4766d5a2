//! Live Tape - snapshot polling core
//!
//! Polls a single HTTP endpoint for the current quote, recent bars and the
//! session profile, normalises each response into an immutable [`Snapshot`]
//! and publishes it to subscribers.
//!
//! The library includes:
//! - Typed snapshot model
//! - Lenient payload normalisation
//! - HTTP snapshot source
//! - Poller lifecycle (start/stop, stale and cancelled fetch protection)
pub mod config;
pub mod error;
pub mod normalize;
pub mod poller;
pub mod snapshot;
pub mod source;

pub use config::PollerConfig;
pub use error::PollError;
pub use normalize::{normalize_snapshot, parse_snapshot};
pub use poller::{PollerState, SnapshotPoller};
pub use snapshot::{
    Bar, Extensions, InitialBalance, PreviousSession, Quote, SessionContext, SessionStats,
    Snapshot, TailKind, TailLevel, TailOpportunity,
};
pub use source::{HttpSource, RawResponse, SnapshotSource};
