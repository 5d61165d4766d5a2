//! Price metric cards and the session-context panel

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tape_data::{Quote, SessionContext, TailKind};

use crate::dashboard::{C_ACCENT, C_BRIGHT, C_BUY, C_DIM, C_SELL};
use crate::format::{PLACEHOLDER, format_decimal, format_price, format_signed, format_volume};

/// One metric card: label, value, footnote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
    pub footnote: String,
}

/// Quote mapped to the four metric cards
pub fn metric_cards(quote: Option<&Quote>) -> [MetricCard; 4] {
    let price = |f: fn(&Quote) -> Option<f64>| quote.map(|q| format_price(f(q)));
    let placeholder = || PLACEHOLDER.to_string();

    [
        MetricCard {
            label: "Current Price",
            value: price(|q| q.price).unwrap_or_else(placeholder),
            footnote: match quote.and_then(|q| q.timestamp.as_deref()) {
                Some(timestamp) => format!("Latest trading day: {timestamp}"),
                None => "Waiting for first tick…".to_string(),
            },
        },
        MetricCard {
            label: "Day High",
            value: price(|q| q.high).unwrap_or_else(placeholder),
            footnote: "as reported upstream".to_string(),
        },
        MetricCard {
            label: "Day Low",
            value: price(|q| q.low).unwrap_or_else(placeholder),
            footnote: "session intraday low".to_string(),
        },
        MetricCard {
            label: "Volume",
            value: quote
                .map(|q| format_volume(q.volume))
                .unwrap_or_else(placeholder),
            footnote: "shares traded today".to_string(),
        },
    ]
}

/// Render the metrics row
pub fn render_price_metrics(f: &mut Frame, area: Rect, quote: Option<&Quote>) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(31),
            Constraint::Percentage(23),
            Constraint::Percentage(23),
            Constraint::Percentage(23),
        ])
        .split(area);

    for (index, card) in metric_cards(quote).into_iter().enumerate() {
        let value_style = if index == 0 {
            Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_BRIGHT)
        };

        let block = Block::default()
            .title(format!(" {} ", card.label))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if index == 0 { C_ACCENT } else { C_DIM }));

        let lines = vec![
            Line::from(Span::styled(card.value, value_style)),
            Line::from(Span::styled(card.footnote, Style::default().fg(C_DIM))),
        ];
        f.render_widget(Paragraph::new(lines).block(block), columns[index]);
    }
}

fn label(text: &'static str) -> Span<'static> {
    Span::styled(format!("{text:<22}"), Style::default().fg(C_DIM))
}

fn muted(text: &'static str) -> Span<'static> {
    Span::styled(text, Style::default().fg(C_DIM))
}

fn tail_color(kind: TailKind) -> ratatui::style::Color {
    if kind.is_buying() { C_BUY } else { C_SELL }
}

/// Session context mapped to one line per block
pub fn session_context_lines(context: &SessionContext) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(5);

    // === TAIL OPPORTUNITY ===
    let mut spans = vec![label("Tail opportunity")];
    match &context.tail_opportunity {
        Some(tail) => {
            spans.push(Span::styled(
                tail.kind.label(),
                Style::default().fg(tail_color(tail.kind)).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(format!(" at {}", format_price(tail.price))));
            if tail.distance_from_current_price.is_some() {
                spans.push(Span::raw(format!(
                    " · {} from current",
                    format_signed(tail.distance_from_current_price)
                )));
            }
            if let Some(target) = tail.reversion_target {
                spans.push(Span::raw(" · reversion target POC "));
                spans.push(Span::styled(format_price(Some(target)), Style::default().fg(C_ACCENT)));
            }
            if tail.confidence.is_some() {
                spans.push(Span::styled(
                    format!(" (confidence {})", format_decimal(tail.confidence)),
                    Style::default().fg(C_DIM),
                ));
            }
        }
        None => spans.push(muted("No tail opportunity")),
    }
    lines.push(Line::from(spans));

    // === POC / VALUE AREA ===
    let mut spans = vec![label("POC / value area")];
    match &context.session_stats {
        Some(stats) if stats.poc.is_some() => spans.push(Span::raw(format!(
            "POC {} · VA {} – {}",
            format_price(stats.poc),
            format_price(stats.value_area_low),
            format_price(stats.value_area_high),
        ))),
        _ => spans.push(muted(PLACEHOLDER)),
    }
    lines.push(Line::from(spans));

    // === INITIAL BALANCE ===
    let mut spans = vec![label("Initial balance (1h)")];
    match &context.initial_balance {
        Some(ib) if ib.high.is_some() => spans.push(Span::raw(format!(
            "{} – {} · range {}",
            format_price(ib.low),
            format_price(ib.high),
            format_decimal(ib.range),
        ))),
        _ => spans.push(muted(PLACEHOLDER)),
    }
    lines.push(Line::from(spans));

    // === EXTENSIONS ===
    let mut spans = vec![label("Extensions beyond IB")];
    match context.extensions {
        Some(ext) => {
            spans.push(if ext.above_ib {
                Span::styled("Above IB", Style::default().fg(C_BUY))
            } else {
                muted("Not above IB")
            });
            spans.push(Span::raw(" · "));
            spans.push(if ext.below_ib {
                Span::styled("Below IB", Style::default().fg(C_SELL))
            } else {
                muted("Not below IB")
            });
        }
        None => spans.push(muted(PLACEHOLDER)),
    }
    lines.push(Line::from(spans));

    // === PREVIOUS SESSION ===
    let mut spans = vec![label("Previous session")];
    match &context.previous_session {
        Some(previous) if previous.stats.poc.is_some() => {
            spans.push(Span::raw(format!(
                "POC {} · VA {} – {}",
                format_price(previous.stats.poc),
                format_price(previous.stats.value_area_low),
                format_price(previous.stats.value_area_high),
            )));
            if previous.tail_count() > 0 {
                spans.push(Span::raw(format!(" · {} tail(s)", previous.tail_count())));
            }
        }
        _ => spans.push(muted(PLACEHOLDER)),
    }
    lines.push(Line::from(spans));

    lines
}

/// Render the session-context panel
pub fn render_session_context(f: &mut Frame, area: Rect, context: Option<&SessionContext>) {
    let block = Block::default()
        .title(" SESSION CONTEXT (5m profile) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_DIM));

    let lines = match context {
        Some(context) => session_context_lines(context),
        None => vec![Line::from(muted("Waiting for session profile…"))],
    };

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
