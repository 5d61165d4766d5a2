//! Feed status indicator

use ratatui::style::Color;
use tape_data::PollerState;

/// Connection status shown in the status row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// No quote yet and no error
    Connecting,
    /// Last cycle succeeded
    Live,
    /// Last cycle failed
    Disconnected,
}

impl FeedStatus {
    /// Derived only from (error present?, quote present?)
    pub fn from_state(state: &PollerState) -> Self {
        let has_quote = state
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.quote.is_some());

        match (state.error.is_some(), has_quote) {
            (true, _) => FeedStatus::Disconnected,
            (false, true) => FeedStatus::Live,
            (false, false) => FeedStatus::Connecting,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedStatus::Connecting => "Connecting…",
            FeedStatus::Live => "Live",
            FeedStatus::Disconnected => "Disconnected",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            FeedStatus::Connecting => Color::Rgb(120, 120, 120),
            FeedStatus::Live => Color::Rgb(100, 220, 100),
            FeedStatus::Disconnected => Color::Rgb(220, 100, 100),
        }
    }
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tape_data::{Quote, Snapshot, parse_snapshot};

    fn with_quote() -> Option<Arc<Snapshot>> {
        Some(Arc::new(Snapshot {
            quote: Some(Quote::default()),
            ..Default::default()
        }))
    }

    #[test]
    fn test_feed_status_from_state() {
        struct TestCase {
            input: PollerState,
            expected: FeedStatus,
        }

        let tests = vec![
            TestCase {
                // TC0: nothing yet
                input: PollerState::default(),
                expected: FeedStatus::Connecting,
            },
            TestCase {
                // TC1: quote present, no error
                input: PollerState {
                    snapshot: with_quote(),
                    ..Default::default()
                },
                expected: FeedStatus::Live,
            },
            TestCase {
                // TC2: error before any quote
                input: PollerState {
                    error: Some("HTTP 500".to_string()),
                    ..Default::default()
                },
                expected: FeedStatus::Disconnected,
            },
            TestCase {
                // TC3: error with a retained quote
                input: PollerState {
                    snapshot: with_quote(),
                    error: Some("HTTP 500".to_string()),
                    ..Default::default()
                },
                expected: FeedStatus::Disconnected,
            },
            TestCase {
                // TC4: snapshot without quote
                input: PollerState {
                    snapshot: Some(Arc::new(Snapshot::default())),
                    ..Default::default()
                },
                expected: FeedStatus::Connecting,
            },
            TestCase {
                // TC5: valid JSON that is not an object still counts as a successful poll
                input: PollerState {
                    snapshot: Some(Arc::new(parse_snapshot("[]").unwrap())),
                    ..Default::default()
                },
                expected: FeedStatus::Live,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(FeedStatus::from_state(&test.input), test.expected, "TC{} failed", index);
        }
    }
}
