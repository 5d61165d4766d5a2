//! Poller configuration
//!
//! Defaults target the local snapshot API; every value can be overridden from the
//! environment or with the builder methods.

use std::time::Duration;

/// Default snapshot endpoint (local proxy).
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api/tsla";

/// Default period between fetch starts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Snapshot poller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Snapshot endpoint, fetched with a plain GET
    pub url: String,
    /// Fixed period between fetch starts
    pub poll_interval: Duration,
    /// Upper bound on a single request before it counts as a transport failure
    pub request_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl PollerConfig {
    /// Create a new configuration with custom URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Build configuration from `TAPE_API_URL`, `TAPE_POLL_INTERVAL_MS` and
    /// `TAPE_REQUEST_TIMEOUT_MS`, falling back to defaults for unset or unparseable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str| {
            lookup(key)
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
        };

        let defaults = Self::default();
        Self {
            url: lookup("TAPE_API_URL").unwrap_or(defaults.url),
            poll_interval: millis("TAPE_POLL_INTERVAL_MS").unwrap_or(defaults.poll_interval),
            request_timeout: millis("TAPE_REQUEST_TIMEOUT_MS").unwrap_or(defaults.request_timeout),
        }
    }

    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
