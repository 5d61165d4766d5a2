//! Terminal candlestick chart
//!
//! One column per bar (plus a gap), one row per price band. Bodies are drawn
//! with `█`, wicks with `│`, and tail levels as dashed `╌` markers across the
//! empty cells of their row.

use chrono::TimeDelta;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tape_data::{Bar, Snapshot, TailKind, TailLevel, TailOpportunity};

use crate::dashboard::{C_BUY, C_DIM, C_SELL};
use crate::format::{format_fixed, format_price, format_signed};

/// Width of the price axis gutter, including the tick glyph
const AXIS_WIDTH: usize = 12;

const C_BUY_MARKER: Color = Color::Rgb(60, 130, 60);
const C_SELL_MARKER: Color = Color::Rgb(130, 60, 60);

/// Spacing of the last two bars, used to label the chart without hardcoding a width
pub fn bar_interval(bars: &[Bar]) -> Option<TimeDelta> {
    let [.., previous, last] = bars else {
        return None;
    };
    let interval = last.time - previous.time;
    (interval > TimeDelta::zero()).then_some(interval)
}

/// Compact interval label, e.g. `30m`, `1h`, `1d`
pub fn describe_interval(interval: TimeDelta) -> String {
    let secs = interval.num_seconds();
    match secs {
        s if s > 0 && s % 86_400 == 0 => format!("{}d", s / 86_400),
        s if s > 0 && s % 3_600 == 0 => format!("{}h", s / 3_600),
        s if s > 0 && s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}

/// Chart header badge for the current tail. `None` hides the badge.
pub fn tail_badge(tail: Option<&TailOpportunity>) -> Option<Line<'static>> {
    let tail = tail?;
    let color = tail_color(tail.kind);

    let mut spans = vec![
        Span::styled(
            format!(" {} ", tail.kind.label()),
            Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" @ {}", format_price(tail.price)), Style::default().fg(color)),
    ];
    if tail.distance_from_poc.is_some() {
        spans.push(Span::styled(
            format!(" {} vs POC", format_signed(tail.distance_from_poc)),
            Style::default().fg(C_DIM),
        ));
    }
    spans.push(Span::raw(" "));

    Some(Line::from(spans))
}

fn tail_color(kind: TailKind) -> Color {
    if kind.is_buying() { C_BUY } else { C_SELL }
}

fn marker_color(kind: TailKind) -> Color {
    if kind.is_buying() { C_BUY_MARKER } else { C_SELL_MARKER }
}

/// Render bars into `height` rows that fit in `width` columns (axis included).
///
/// When there are more bars than columns the most recent ones are kept.
pub fn candle_lines(bars: &[Bar], markers: &[TailLevel], width: u16, height: u16) -> Vec<Line<'static>> {
    let columns = (width as usize).saturating_sub(AXIS_WIDTH) / 2;
    if bars.is_empty() || columns == 0 || height == 0 {
        return vec![Line::from(Span::styled("No bars yet", Style::default().fg(C_DIM)))];
    }

    let visible = &bars[bars.len().saturating_sub(columns)..];
    let (mut low, mut high) = visible
        .iter()
        .fold((f64::MAX, f64::MIN), |(low, high), bar| (low.min(bar.low), high.max(bar.high)));
    if high - low < 1e-9 {
        low -= 0.5;
        high += 0.5;
    }

    let rows = height as usize;
    let step = (high - low) / rows as f64;
    let row_of = |price: f64| (((high - price) / step) as usize).min(rows - 1);

    let marker_rows: Vec<(usize, TailKind)> = markers
        .iter()
        .filter_map(|marker| {
            let price = marker.price.filter(|p| (low..=high).contains(p))?;
            Some((row_of(price), marker.kind))
        })
        .collect();

    let mut lines = Vec::with_capacity(rows);
    for row in 0..rows {
        let top = high - row as f64 * step;
        let bottom = top - step;

        let axis = if row == 0 || row == rows - 1 || row == rows / 2 {
            format!("{:>width$} ┤", format_fixed(top - step / 2.0, 2), width = AXIS_WIDTH - 2)
        } else {
            format!("{:>width$}│", "", width = AXIS_WIDTH - 1)
        };

        let marker = marker_rows.iter().find(|(r, _)| *r == row).map(|(_, kind)| *kind);
        let filler = match marker {
            Some(kind) => Span::styled("╌", Style::default().fg(marker_color(kind))),
            None => Span::raw(" "),
        };

        let mut spans = Vec::with_capacity(1 + visible.len() * 2);
        spans.push(Span::styled(axis, Style::default().fg(C_DIM)));

        for bar in visible {
            let color = if bar.is_up() { C_BUY } else { C_SELL };
            let cell = if bar.body_high() >= bottom && bar.body_low() <= top {
                Span::styled("█", Style::default().fg(color))
            } else if bar.high >= bottom && bar.low <= top {
                Span::styled("│", Style::default().fg(color))
            } else {
                filler.clone()
            };
            spans.push(cell);
            spans.push(filler.clone());
        }

        lines.push(Line::from(spans));
    }

    lines
}

/// Render the chart card: title with bar interval, tail badge, candles
pub fn render_chart(f: &mut Frame, area: Rect, snapshot: Option<&Snapshot>, symbol: &str) {
    let bars = snapshot.map(|s| s.bars.as_slice()).unwrap_or_default();

    let interval = bar_interval(bars)
        .map(|i| format!("{} ", describe_interval(i)))
        .unwrap_or_default();
    let mut block = Block::default()
        .title(format!(" {interval}{symbol} bars · latest {} ", bars.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_DIM));

    if let Some(badge) = tail_badge(snapshot.and_then(|s| s.current_tail.as_ref())) {
        block = block.title_top(badge.right_aligned());
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut markers: Vec<TailLevel> = snapshot
        .map(|s| s.session_context.all_tails.clone())
        .unwrap_or_default();
    if let Some(tail) = snapshot.and_then(|s| s.current_tail.as_ref()) {
        markers.push(TailLevel {
            kind: tail.kind,
            price: tail.price,
        });
    }

    let lines = candle_lines(bars, &markers, inner.width, inner.height);
    f.render_widget(Paragraph::new(lines), inner);
}
