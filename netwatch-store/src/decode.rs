//! Column decoding for `JSONEachRow` rows.
//!
//! ClickHouse quotes 64-bit integers and may emit `nan`/`inf` for floating
//! point aggregates over empty sets. These helpers accept those forms and
//! reject anything that is not a plausible value for the column.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::{Row, StoreError};

/// Read an unsigned integer column. Null or missing yields 0.
pub fn uint(row: &Row, column: &str) -> Result<u64, StoreError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                Ok(v)
            } else if let Some(v) = n.as_f64() {
                Ok(float_to_uint(v))
            } else {
                Err(StoreError::column(column, format!("unsupported number {}", n)))
            }
        }
        Some(Value::String(s)) => parse_uint_text(s.trim())
            .ok_or_else(|| StoreError::column(column, format!("expected a number, got {:?}", s))),
        Some(other) => Err(StoreError::column(
            column,
            format!("expected a number, got {}", kind(other)),
        )),
    }
}

/// Read a floating point column. Null, missing, `nan` and `inf` yield 0.0.
pub fn float(row: &Row, column: &str) -> Result<f64, StoreError> {
    let value = match row.get(column) {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| StoreError::column(column, format!("unsupported number {}", n)))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| StoreError::column(column, format!("expected a number, got {:?}", s)))?,
        Some(other) => {
            return Err(StoreError::column(
                column,
                format!("expected a number, got {}", kind(other)),
            ))
        }
    };

    Ok(if value.is_finite() { value } else { 0.0 })
}

/// Read a text column. Null or missing yields an empty string; numbers are
/// rendered as text.
pub fn text(row: &Row, column: &str) -> Result<String, StoreError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(StoreError::column(
            column,
            format!("expected text, got {}", kind(other)),
        )),
    }
}

/// Read a port column, rejecting values outside `u16`.
pub fn port(row: &Row, column: &str) -> Result<u16, StoreError> {
    let raw = uint(row, column)?;
    u16::try_from(raw).map_err(|_| StoreError::column(column, format!("port {} out of range", raw)))
}

/// Read a timestamp column.
///
/// Accepts `YYYY-MM-DD HH:MM:SS` (UTC), RFC 3339 and unix seconds. Unlike
/// the numeric helpers a missing timestamp is an error: a bucket without a
/// time cannot be placed.
pub fn timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>, StoreError> {
    match row.get(column) {
        None | Some(Value::Null) => Err(StoreError::column(column, "missing timestamp")),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or_else(|| StoreError::column(column, format!("invalid unix time {}", n))),
        Some(Value::String(s)) => parse_timestamp_text(s.trim())
            .ok_or_else(|| StoreError::column(column, format!("invalid timestamp {:?}", s))),
        Some(other) => Err(StoreError::column(
            column,
            format!("expected a timestamp, got {}", kind(other)),
        )),
    }
}

fn parse_uint_text(s: &str) -> Option<u64> {
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    s.parse::<f64>().ok().map(float_to_uint)
}

fn float_to_uint(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.round() as u64
    } else {
        0
    }
}

fn parse_timestamp_text(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[test]
    fn test_uint_accepts_quoted_integers() {
        let r = row(json!({"a": "18446744073709551615", "b": 42, "c": "17.0"}));
        assert_eq!(uint(&r, "a").unwrap(), u64::MAX);
        assert_eq!(uint(&r, "b").unwrap(), 42);
        assert_eq!(uint(&r, "c").unwrap(), 17);
    }

    #[test]
    fn test_null_and_missing_default_to_zero() {
        let r = row(json!({"a": null}));
        assert_eq!(uint(&r, "a").unwrap(), 0);
        assert_eq!(uint(&r, "missing").unwrap(), 0);
        assert_eq!(float(&r, "a").unwrap(), 0.0);
        assert_eq!(text(&r, "missing").unwrap(), "");
    }

    #[test]
    fn test_float_non_finite_is_zero() {
        let r = row(json!({"a": "nan", "b": "inf", "c": "-inf", "d": 12.5}));
        assert_eq!(float(&r, "a").unwrap(), 0.0);
        assert_eq!(float(&r, "b").unwrap(), 0.0);
        assert_eq!(float(&r, "c").unwrap(), 0.0);
        assert_eq!(float(&r, "d").unwrap(), 12.5);
    }

    #[test]
    fn test_non_numeric_is_malformed() {
        let r = row(json!({"a": "lots", "b": true, "c": [1], "d": {"x": 1}}));
        for column in ["a", "b", "c", "d"] {
            assert!(matches!(uint(&r, column), Err(StoreError::Malformed(_))));
            assert!(matches!(float(&r, column), Err(StoreError::Malformed(_))));
        }
    }

    #[test]
    fn test_text_renders_numbers() {
        let r = row(json!({"a": "HTTPS", "b": 443, "c": false}));
        assert_eq!(text(&r, "a").unwrap(), "HTTPS");
        assert_eq!(text(&r, "b").unwrap(), "443");
        assert!(text(&r, "c").is_err());
    }

    #[test]
    fn test_port_range() {
        let r = row(json!({"ok": "8443", "bad": 70000}));
        assert_eq!(port(&r, "ok").unwrap(), 8443);
        assert!(port(&r, "bad").is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 6, 13, 0, 0).unwrap();
        let r = row(json!({
            "plain": "2024-05-06 13:00:00",
            "rfc": "2024-05-06T15:00:00+02:00",
            "unix": expected.timestamp(),
            "unix_text": expected.timestamp().to_string(),
        }));

        assert_eq!(timestamp(&r, "plain").unwrap(), expected);
        assert_eq!(timestamp(&r, "rfc").unwrap(), expected);
        assert_eq!(timestamp(&r, "unix").unwrap(), expected);
        assert_eq!(timestamp(&r, "unix_text").unwrap(), expected);
        assert!(timestamp(&r, "missing").is_err());
    }
}
