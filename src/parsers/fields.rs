//! Field matching and type coercion for slow log annotation lines

use crate::error::{parse_error, timestamp_error, Result, SlowlogError};
use crate::rules::{Rule, ValueKind};
use chrono::{Duration, NaiveDateTime};

/// Timestamp layout used by `# Time:` lines, e.g. `230101 10:00:00`
pub const LOG_TIMESTAMP_FORMAT: &str = "%y%m%d %H:%M:%S";

/// A typed value stored in a record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Timestamp(NaiveDateTime),
    Duration(Duration),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            FieldValue::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Apply a rule's pattern to a line, returning the captured raw value
pub fn match_field<'l>(line: &'l str, rule: &Rule) -> Option<&'l str> {
    rule.pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Convert raw captured text into a typed value according to its kind
pub fn coerce(raw: &str, rule: &Rule) -> Result<FieldValue> {
    match rule.kind {
        ValueKind::Datetime => parse_timestamp(raw).map(FieldValue::Timestamp),
        ValueKind::Duration => parse_seconds(raw).map(FieldValue::Duration),
        ValueKind::String => Ok(FieldValue::Text(raw.to_string())),
        ValueKind::Integer => raw
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|e| parse_error(&format!("invalid integer for {}: {:?} ({})", rule.field_name, raw, e), None, None)),
        ValueKind::Boolean => match raw {
            "Yes" => Ok(FieldValue::Boolean(true)),
            "No" => Ok(FieldValue::Boolean(false)),
            other => Err(SlowlogError::InvalidBooleanToken {
                field: rule.field_name.clone(),
                token: other.to_string(),
                line_number: None,
            }),
        },
    }
}

/// Parse a `YYMMDD HH:MM:SS` log timestamp
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), LOG_TIMESTAMP_FORMAT)
        .map_err(|e| timestamp_error(&format!("expected YYMMDD HH:MM:SS: {}", e), raw))
}

/// Parse a decimal count of seconds exactly, down to nanoseconds.
///
/// Digits past the ninth fractional place are truncated.
pub fn parse_seconds(raw: &str) -> Result<Duration> {
    let invalid = || parse_error(&format!("invalid duration: {:?}", raw), None, None);

    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let secs: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };

    let mut nanos: i64 = 0;
    for (i, digit) in fraction.bytes().take(9).enumerate() {
        nanos += i64::from(digit - b'0') * 10_i64.pow(8 - i as u32);
    }

    Duration::try_seconds(secs)
        .and_then(|d| d.checked_add(&Duration::nanoseconds(nanos)))
        .ok_or_else(invalid)
}
