//! Number and time formatting for the dashboard
//!
//! All helpers take `Option<f64>` and render `None` as [`PLACEHOLDER`], so a
//! missing upstream value never shows up as 0.

use chrono::{DateTime, Local, Utc};

/// Rendered in place of any missing value
pub const PLACEHOLDER: &str = "—";

/// Insert `,` every three digits of an unsigned integer string
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Fixed decimals with thousands separators, e.g. `-1,234.50`
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let rounded = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match rounded.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (rounded.as_str(), None),
    };

    let is_zero = rounded.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    match fraction {
        Some(fraction) => format!("{sign}{}.{fraction}", group_thousands(integer)),
        None => format!("{sign}{}", group_thousands(integer)),
    }
}

/// Currency with exactly two decimals, e.g. `$1,234.50`
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) if v < 0.0 => format!("-${}", format_fixed(v.abs(), 2)),
        Some(v) => format!("${}", format_fixed(v, 2)),
        None => PLACEHOLDER.to_string(),
    }
}

/// Two decimals without currency sign
pub fn format_decimal(value: Option<f64>) -> String {
    value
        .map(|v| format_fixed(v, 2))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Two decimals with an explicit `+` for non-negative values
pub fn format_signed(value: Option<f64>) -> String {
    match value {
        Some(v) if v >= 0.0 => format!("+{}", format_fixed(v, 2)),
        Some(v) => format_fixed(v, 2),
        None => PLACEHOLDER.to_string(),
    }
}

/// Thousands separated, up to three fractional digits, e.g. `1,000,000`
pub fn format_volume(value: Option<f64>) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };

    let fixed = format_fixed(value, 3);
    match fixed.split_once('.') {
        Some((integer, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                integer.to_string()
            } else {
                format!("{integer}.{fraction}")
            }
        }
        None => fixed,
    }
}

/// Local wall-clock time of the last successful update
pub fn format_last_updated(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
