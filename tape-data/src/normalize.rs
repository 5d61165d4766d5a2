//! Payload normalisation
//!
//! Turns a raw JSON body into a [`Snapshot`]. Only an unparseable body is an
//! error; every malformed field inside a valid body degrades to a safe default
//! (`None`, `false` or an empty list) so one bad value never fails the cycle.

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::PollError;
use crate::snapshot::{
    Bar, Extensions, InitialBalance, PreviousSession, Quote, SessionContext, SessionStats,
    Snapshot, TailKind, TailLevel, TailOpportunity,
};

type Fields = Map<String, Value>;

/// Parse and normalise a response body
pub fn parse_snapshot(body: &str) -> Result<Snapshot, PollError> {
    let payload: Value = serde_json::from_str(body)?;
    Ok(normalize_snapshot(&payload))
}

/// Normalise an already parsed payload
pub fn normalize_snapshot(payload: &Value) -> Snapshot {
    let Some(fields) = payload.as_object() else {
        debug!("Snapshot payload is not a JSON object, publishing empty quote");
        return Snapshot {
            quote: Some(Quote::default()),
            ..Default::default()
        };
    };

    Snapshot {
        quote: Some(normalize_quote(fields)),
        bars: normalize_bars(fields.get("bars")),
        current_tail: normalize_tail(fields.get("current_tail")),
        session_context: SessionContext {
            tail_opportunity: normalize_tail(fields.get("current_tail_opportunity")),
            session_stats: object(fields.get("session_stats")).map(normalize_stats),
            initial_balance: object(fields.get("initial_balance")).map(|ib| InitialBalance {
                high: number(ib.get("high")),
                low: number(ib.get("low")),
                range: number(ib.get("range")),
            }),
            extensions: object(fields.get("extensions")).map(|ext| Extensions {
                above_ib: truthy(ext.get("above_ib")),
                below_ib: truthy(ext.get("below_ib")),
            }),
            previous_session: object(fields.get("previous_session")).map(|prev| PreviousSession {
                stats: normalize_stats(prev),
                tails: normalize_tail_levels(prev.get("tails")),
            }),
            all_tails: normalize_tail_levels(fields.get("all_tails")),
        },
    }
}

fn normalize_quote(fields: &Fields) -> Quote {
    Quote {
        price: number(fields.get("price")),
        high: number(fields.get("high")),
        low: number(fields.get("low")),
        volume: number(fields.get("volume")),
        timestamp: fields
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Anything other than an array normalises to an empty sequence
fn normalize_bars(value: Option<&Value>) -> Vec<Bar> {
    let Some(Value::Array(items)) = value else {
        if value.is_some_and(|v| !v.is_null()) {
            debug!("Snapshot bars field is not an array, substituting empty bars");
        }
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let bar = normalize_bar(item);
            if bar.is_none() {
                debug!(index, "Dropping malformed bar");
            }
            bar
        })
        .collect()
}

fn normalize_bar(item: &Value) -> Option<Bar> {
    let fields = item.as_object()?;
    Some(Bar {
        time: timestamp(fields.get("time")?)?,
        open: number(fields.get("open"))?,
        high: number(fields.get("high"))?,
        low: number(fields.get("low"))?,
        close: number(fields.get("close"))?,
        volume: number(fields.get("volume")),
    })
}

/// A tail is only valid when `type` is truthy
fn normalize_tail(value: Option<&Value>) -> Option<TailOpportunity> {
    let fields = object(value)?;
    let kind = tail_kind(fields.get("type"))?;
    Some(TailOpportunity {
        kind,
        price: number(fields.get("price")),
        distance_from_current_price: number(fields.get("distance_from_current_price")),
        distance_from_poc: number(fields.get("distance_from_poc")),
        reversion_target: number(fields.get("reversion_target")),
        confidence: number(fields.get("confidence")),
    })
}

fn normalize_tail_levels(value: Option<&Value>) -> Vec<TailLevel> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let fields = item.as_object()?;
            Some(TailLevel {
                kind: tail_kind(fields.get("type"))?,
                price: number(fields.get("price")),
            })
        })
        .collect()
}

fn normalize_stats(fields: &Fields) -> SessionStats {
    SessionStats {
        poc: number(fields.get("poc")),
        value_area_low: number(fields.get("value_area_low")),
        value_area_high: number(fields.get("value_area_high")),
        session_high: number(fields.get("session_high")),
        session_low: number(fields.get("session_low")),
    }
}

fn object(value: Option<&Value>) -> Option<&Fields> {
    value?.as_object()
}

/// Any truthy `type` is a tail. Only `buying_tail` is a buying tail, every
/// other value is treated as a selling tail.
fn tail_kind(value: Option<&Value>) -> Option<TailKind> {
    let value = value.filter(|v| truthy(Some(*v)))?;
    match value.as_str().and_then(TailKind::from_wire) {
        Some(kind) => Some(kind),
        None => {
            debug!(tail_type = %value, "Unrecognised tail type, treating as selling tail");
            Some(TailKind::SellingTail)
        }
    }
}

/// Coerce a JSON leaf to a finite number. Numeric strings are accepted.
fn number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(raw)) => !raw.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// RFC 3339 string or epoch milliseconds
fn timestamp(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw.trim()).ok(),
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?).map(|t| t.fixed_offset()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_array_bars_normalize_to_empty() {
        struct TestCase {
            input: Value,
        }

        let tests = vec![
            // TC0: null
            TestCase { input: Value::Null },
            // TC1: object
            TestCase { input: json!({"time": "2024-01-01T09:30:00Z", "open": 1, "high": 1, "low": 1, "close": 1}) },
            // TC2: string
            TestCase { input: json!("bars") },
            // TC3: number
            TestCase { input: json!(42) },
            // TC4: boolean
            TestCase { input: json!(true) },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let snapshot = normalize_snapshot(&json!({"price": 1.0, "bars": test.input}));
            assert!(snapshot.bars.is_empty(), "TC{} failed", index);
            assert!(snapshot.quote.is_some(), "TC{} failed", index);
        }
    }

    #[test]
    fn test_current_tail_gated_on_type() {
        struct TestCase {
            input: Value,
            expected: Option<TailKind>,
        }

        let tests = vec![
            TestCase {
                // TC0: buying tail
                input: json!({"type": "buying_tail", "price": 418.0}),
                expected: Some(TailKind::BuyingTail),
            },
            TestCase {
                // TC1: selling tail
                input: json!({"type": "selling_tail", "price": 431.0}),
                expected: Some(TailKind::SellingTail),
            },
            TestCase {
                // TC2: null type, as the upstream sends when no tail exists
                input: json!({"type": null, "price": null, "distance_from_poc": null}),
                expected: None,
            },
            TestCase {
                // TC3: empty type
                input: json!({"type": "", "price": 418.0}),
                expected: None,
            },
            TestCase {
                // TC4: type key missing
                input: json!({"price": 418.0}),
                expected: None,
            },
            TestCase {
                // TC5: falsy non-string type
                input: json!({"type": false}),
                expected: None,
            },
            TestCase {
                // TC6: tail is not an object
                input: json!("buying_tail"),
                expected: None,
            },
            TestCase {
                // TC7: unrecognised string
                input: json!({"type": "selling", "price": 431.0}),
                expected: Some(TailKind::SellingTail),
            },
            TestCase {
                // TC8: only the exact wire name is a buying tail
                input: json!({"type": "BUYING_TAIL", "price": 418.0}),
                expected: Some(TailKind::SellingTail),
            },
            TestCase {
                // TC9: boolean true
                input: json!({"type": true, "price": 418.0}),
                expected: Some(TailKind::SellingTail),
            },
            TestCase {
                // TC10: non-zero number
                input: json!({"type": 1, "price": 418.0}),
                expected: Some(TailKind::SellingTail),
            },
            TestCase {
                // TC11: zero
                input: json!({"type": 0}),
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let snapshot = normalize_snapshot(&json!({"current_tail": test.input}));
            let actual = snapshot.current_tail.map(|tail| tail.kind);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_numeric_coercion() {
        struct TestCase {
            input: Value,
            expected: Option<f64>,
        }

        let tests = vec![
            TestCase { input: json!(420.5), expected: Some(420.5) },
            TestCase { input: json!("420.5"), expected: Some(420.5) },
            TestCase { input: json!(" 17 "), expected: Some(17.0) },
            TestCase { input: json!("abc"), expected: None },
            TestCase { input: json!("NaN"), expected: None },
            TestCase { input: json!(""), expected: None },
            TestCase { input: Value::Null, expected: None },
            TestCase { input: json!(true), expected: None },
            TestCase { input: json!([1]), expected: None },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(number(Some(&test.input)), test.expected, "TC{} failed", index);
        }
        assert_eq!(number(None), None);
    }

    #[test]
    fn test_malformed_price_does_not_fail_snapshot() {
        let snapshot = normalize_snapshot(&json!({
            "price": "n/a",
            "high": 430,
            "low": 410,
            "volume": 1_000_000,
            "timestamp": "2024-01-01T10:00:00",
        }));

        let quote = snapshot.quote.unwrap();
        assert_eq!(quote.price, None);
        assert_eq!(quote.high, Some(430.0));
        assert_eq!(quote.low, Some(410.0));
        assert_eq!(quote.volume, Some(1_000_000.0));
        assert_eq!(quote.timestamp.as_deref(), Some("2024-01-01T10:00:00"));
    }

    #[test]
    fn test_end_to_end_payload() {
        let body = r#"{
            "price": "420.5",
            "high": 430,
            "low": 410,
            "volume": 1000000,
            "bars": [{"time": "2024-01-01T09:30:00Z", "open": 420, "high": 425, "low": 418, "close": 422}],
            "current_tail": {"type": "buying_tail", "price": 418}
        }"#;

        let snapshot = parse_snapshot(body).unwrap();

        assert_eq!(snapshot.quote.as_ref().and_then(|q| q.price), Some(420.5));
        assert_eq!(snapshot.bars.len(), 1);
        assert_eq!(snapshot.bars[0].close, 422.0);
        assert_eq!(snapshot.bars[0].volume, None);

        let tail = snapshot.current_tail.unwrap();
        assert_eq!(tail.kind, TailKind::BuyingTail);
        assert_eq!(tail.price, Some(418.0));

        // Context is present even though the payload sent none of its records
        assert_eq!(snapshot.session_context, SessionContext::default());
    }

    #[test]
    fn test_missing_current_tail() {
        let snapshot = normalize_snapshot(&json!({"price": 420.5, "bars": []}));
        assert!(snapshot.current_tail.is_none());
    }

    #[test]
    fn test_malformed_bars_dropped_individually() {
        let snapshot = normalize_snapshot(&json!({
            "bars": [
                {"time": "2024-01-01T09:30:00-05:00", "open": 420, "high": 425, "low": 418, "close": 422, "volume": 12000},
                {"time": "not a time", "open": 420, "high": 425, "low": 418, "close": 422},
                {"time": "2024-01-01T10:00:00-05:00", "open": 422, "high": null, "low": 418, "close": 419},
                "garbage",
                {"time": 1704121200000_i64, "open": "422", "high": 424, "low": 421, "close": 423},
            ]
        }));

        assert_eq!(snapshot.bars.len(), 2);
        assert_eq!(snapshot.bars[0].volume, Some(12000.0));
        assert_eq!(snapshot.bars[0].time.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(snapshot.bars[1].open, 422.0);
        assert_eq!(snapshot.bars[1].time.timestamp_millis(), 1_704_121_200_000);
    }

    #[test]
    fn test_session_context_normalization() {
        let snapshot = normalize_snapshot(&json!({
            "current_tail_opportunity": {
                "type": "selling_tail",
                "price": 431.2,
                "distance_from_current_price": 10.7,
                "confidence": 0.812,
                "reversion_target": 421.0,
            },
            "session_stats": {
                "poc": 421.0,
                "value_area_high": 425.5,
                "value_area_low": 417.25,
                "session_high": 432.0,
                "session_low": 409.8,
            },
            "initial_balance": {"high": 426.0, "low": 415.0, "range": 11.0},
            "extensions": {"above_ib": true, "below_ib": false},
            "previous_session": {
                "poc": 405.0,
                "value_area_high": 410.0,
                "value_area_low": 399.0,
                "tails": [
                    {"price": 395.5, "type": "buying_tail"},
                    {"price": 415.0, "type": "selling_tail"},
                    {"price": 416.0, "type": "mystery"},
                    {"price": 417.0, "type": null},
                ],
            },
            "all_tails": [{"price": 431.2, "type": "selling_tail", "confidence": 0.81}],
        }));

        let context = snapshot.session_context;

        let opportunity = context.tail_opportunity.unwrap();
        assert_eq!(opportunity.kind, TailKind::SellingTail);
        assert_eq!(opportunity.distance_from_current_price, Some(10.7));
        assert_eq!(opportunity.reversion_target, Some(421.0));
        assert_eq!(opportunity.confidence, Some(0.812));

        let stats = context.session_stats.unwrap();
        assert_eq!(stats.poc, Some(421.0));
        assert_eq!(stats.value_area_low, Some(417.25));
        assert_eq!(stats.session_low, Some(409.8));

        assert_eq!(context.initial_balance.unwrap().range, Some(11.0));
        assert_eq!(
            context.extensions,
            Some(Extensions { above_ib: true, below_ib: false })
        );

        let previous = context.previous_session.unwrap();
        assert_eq!(previous.stats.poc, Some(405.0));
        assert_eq!(previous.tail_count(), 3);
        assert_eq!(previous.tails[2].kind, TailKind::SellingTail);

        assert_eq!(context.all_tails.len(), 1);
        assert_eq!(context.all_tails[0].price, Some(431.2));
    }

    #[test]
    fn test_session_context_all_null_fields() {
        let snapshot = normalize_snapshot(&json!({
            "current_tail_opportunity": {"type": null, "price": null, "reversion_target": null},
            "session_stats": {"poc": null, "value_area_high": null, "value_area_low": null},
            "initial_balance": {"high": null, "low": null, "range": null},
            "extensions": {"above_ib": false, "below_ib": false},
            "previous_session": {"poc": null, "tails": "n/a"},
            "all_tails": null,
        }));

        let context = snapshot.session_context;
        assert!(context.tail_opportunity.is_none());
        assert_eq!(context.session_stats, Some(SessionStats::default()));
        assert_eq!(context.initial_balance, Some(InitialBalance::default()));
        assert_eq!(context.extensions, Some(Extensions::default()));
        assert_eq!(context.previous_session, Some(PreviousSession::default()));
        assert!(context.all_tails.is_empty());
    }

    #[test]
    fn test_non_object_payload() {
        for body in ["[1, 2, 3]", "[]", "42", "\"x\""] {
            let snapshot = parse_snapshot(body).unwrap();
            assert_eq!(snapshot.quote, Some(Quote::default()), "{body}");
            assert!(snapshot.bars.is_empty(), "{body}");
            assert!(snapshot.current_tail.is_none(), "{body}");
            assert_eq!(snapshot.session_context, SessionContext::default(), "{body}");
        }
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let error = parse_snapshot("{\"price\": 420.5,").unwrap_err();
        assert!(matches!(error, PollError::Parse(_)));
    }
}
