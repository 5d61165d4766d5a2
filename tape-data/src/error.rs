use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated by a single poll cycle in `tape-data`.
///
/// Every variant is terminal for the cycle that produced it only. The
/// [`SnapshotPoller`](crate::poller::SnapshotPoller) records the rendered message as the
/// current error and keeps the last good snapshot.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum PollError {
    /// Network unreachable, connection reset, request timeout, body read failure.
    #[error("{0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status code.
    #[error("HTTP {0}")]
    Status(u16),

    /// Response body was not valid JSON.
    #[error("{0}")]
    Parse(String),
}

impl PollError {
    /// Determine if the upstream was reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, PollError::Transport(_))
    }
}

impl From<reqwest::Error> for PollError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<serde_json::Error> for PollError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}
