//! Typed snapshot model
//!
//! These types are the normalised form of the JSON payload served by the
//! snapshot endpoint. Every numeric leaf is optional: the upstream may omit or
//! mangle any of them, and consumers render `None` as a placeholder.

use chrono::{DateTime, FixedOffset};

/// Latest quote for the tracked symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quote {
    /// Last traded price
    pub price: Option<f64>,
    /// Session high
    pub high: Option<f64>,
    /// Session low
    pub low: Option<f64>,
    /// Shares traded in the session so far
    pub volume: Option<f64>,
    /// Upstream timestamp, passed through untouched for display
    pub timestamp: Option<String>,
}

/// One OHLC bar. Bars are kept in upstream order (oldest first).
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Bucket open time, upstream offset preserved
    pub time: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Volume traded in the bucket (optional, not every upstream reports it)
    pub volume: Option<f64>,
}

impl Bar {
    /// Check if the bar closed at or above its open
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }

    /// Lower edge of the candle body
    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    /// Upper edge of the candle body
    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }
}

/// Steidlmayer tail classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TailKind {
    BuyingTail,
    SellingTail,
}

impl TailKind {
    /// Parse the upstream wire name (`buying_tail` / `selling_tail`)
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim() {
            "buying_tail" => Some(TailKind::BuyingTail),
            "selling_tail" => Some(TailKind::SellingTail),
            _ => None,
        }
    }

    /// Upstream wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TailKind::BuyingTail => "buying_tail",
            TailKind::SellingTail => "selling_tail",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            TailKind::BuyingTail => "Buying tail",
            TailKind::SellingTail => "Selling tail",
        }
    }

    /// Check if this is a buying tail
    pub fn is_buying(&self) -> bool {
        matches!(self, TailKind::BuyingTail)
    }
}

impl std::fmt::Display for TailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A detected tail with optional trade context.
///
/// Used both for the chart highlight (`current_tail`, which carries
/// `distance_from_poc`) and for the session-context alert
/// (`current_tail_opportunity`, which carries distance, target and confidence).
#[derive(Debug, Clone, PartialEq)]
pub struct TailOpportunity {
    pub kind: TailKind,
    pub price: Option<f64>,
    /// Tail price minus current price (positive = tail above price)
    pub distance_from_current_price: Option<f64>,
    /// Tail price minus session POC
    pub distance_from_poc: Option<f64>,
    /// Price the tail is expected to revert towards (session POC)
    pub reversion_target: Option<f64>,
    /// 0.0..=1.0
    pub confidence: Option<f64>,
}

impl TailOpportunity {
    pub fn new(kind: TailKind) -> Self {
        Self {
            kind,
            price: None,
            distance_from_current_price: None,
            distance_from_poc: None,
            reversion_target: None,
            confidence: None,
        }
    }
}

/// Tail level without trade context, as listed in `all_tails` and `previous_session.tails`
#[derive(Debug, Clone, PartialEq)]
pub struct TailLevel {
    pub kind: TailKind,
    pub price: Option<f64>,
}

/// Volume profile statistics for a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    /// Point of control
    pub poc: Option<f64>,
    pub value_area_low: Option<f64>,
    pub value_area_high: Option<f64>,
    pub session_high: Option<f64>,
    pub session_low: Option<f64>,
}

/// First-hour range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialBalance {
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub range: Option<f64>,
}

/// Whether price has traded outside the initial balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extensions {
    pub above_ib: bool,
    pub below_ib: bool,
}

/// Profile of the previous session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousSession {
    pub stats: SessionStats,
    pub tails: Vec<TailLevel>,
}

impl PreviousSession {
    pub fn tail_count(&self) -> usize {
        self.tails.len()
    }
}

/// Session profile context. Each record is `None` when the upstream did not send it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub tail_opportunity: Option<TailOpportunity>,
    pub session_stats: Option<SessionStats>,
    pub initial_balance: Option<InitialBalance>,
    pub extensions: Option<Extensions>,
    pub previous_session: Option<PreviousSession>,
    /// Every tail level detected in the current session
    pub all_tails: Vec<TailLevel>,
}

/// One normalised response from the snapshot endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Always `Some` once normalised. A non-object payload yields an empty quote
    pub quote: Option<Quote>,
    pub bars: Vec<Bar>,
    /// Chart highlight, present only for a truthy tail `type`
    pub current_tail: Option<TailOpportunity>,
    pub session_context: SessionContext,
}
