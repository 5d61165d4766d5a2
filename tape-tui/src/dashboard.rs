//! Full-screen dashboard layout
//!
//! A pure function of [`PollerState`]: everything on screen is derived from
//! the latest published state, nothing is fetched here.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tape_data::PollerState;

use crate::chart::render_chart;
use crate::format::format_last_updated;
use crate::panels::{render_price_metrics, render_session_context};
use crate::status::FeedStatus;

// Colour palette
pub(crate) const C_BUY: Color = Color::Rgb(100, 220, 100);
pub(crate) const C_SELL: Color = Color::Rgb(220, 100, 100);
pub(crate) const C_NEUTRAL: Color = Color::Rgb(180, 180, 100);
pub(crate) const C_DIM: Color = Color::Rgb(120, 120, 120);
pub(crate) const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
pub(crate) const C_ACCENT: Color = Color::Rgb(100, 180, 220);

pub fn render_dashboard(f: &mut Frame, state: &PollerState, symbol: &str) {
    let snapshot = state.snapshot.as_deref();
    let context = snapshot.map(|s| &s.session_context);

    let mut constraints = vec![Constraint::Length(2), Constraint::Length(4)];
    if snapshot.is_some() {
        constraints.push(Constraint::Length(7));
    }
    constraints.extend([Constraint::Min(8), Constraint::Length(1)]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    render_header(f, chunks[0], symbol);
    render_price_metrics(f, chunks[1], snapshot.and_then(|s| s.quote.as_ref()));

    let (chart_area, status_area) = if snapshot.is_some() {
        render_session_context(f, chunks[2], context);
        (chunks[3], chunks[4])
    } else {
        (chunks[2], chunks[3])
    };

    render_chart(f, chart_area, snapshot, symbol);
    render_status(f, status_area, state);
}

fn render_header(f: &mut Frame, area: Rect, symbol: &str) {
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{symbol} LIVE TAPE"),
                Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  q quit · r refresh", Style::default().fg(C_DIM)),
        ]),
        Line::from(Span::styled(
            "Quote, session profile and intraday bars from the snapshot feed",
            Style::default().fg(C_DIM),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

/// Status row: feed indicator, then last-updated time or the error text
pub fn status_line(state: &PollerState) -> Line<'static> {
    let status = FeedStatus::from_state(state);

    let detail = match (status, state.error.as_deref()) {
        (FeedStatus::Disconnected, Some(error)) => {
            Span::styled(error.to_string(), Style::default().fg(C_SELL))
        }
        _ => Span::styled(
            format!("Last updated: {}", format_last_updated(state.last_updated_at)),
            Style::default().fg(C_NEUTRAL),
        ),
    };

    Line::from(vec![
        Span::styled(
            format!("● {status}"),
            Style::default().fg(status.color()).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        detail,
    ])
}

fn render_status(f: &mut Frame, area: Rect, state: &PollerState) {
    f.render_widget(Paragraph::new(status_line(state)), area);
}
