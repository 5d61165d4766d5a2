//! Live Tape - terminal dashboard
//!
//! Renders the latest [`tape_data::PollerState`] as a price panel, a
//! session-profile panel, a candlestick chart and a feed status line.
pub mod chart;
pub mod dashboard;
pub mod format;
pub mod panels;
pub mod status;

pub use chart::{bar_interval, candle_lines, describe_interval, render_chart, tail_badge};
pub use dashboard::{render_dashboard, status_line};
pub use format::{
    PLACEHOLDER, format_decimal, format_fixed, format_last_updated, format_price, format_signed,
    format_volume,
};
pub use panels::{MetricCard, metric_cards, render_price_metrics, render_session_context, session_context_lines};
pub use status::FeedStatus;
