//! Derived fields and the validity gate applied to completed records

use crate::parsers::{FieldValue, Record};
use crate::rules::{DURATION_FIELD, END_TIME_FIELD};
use crate::sql::QueryType;
use std::fmt;

pub const TIME_START_FIELD: &str = "time_start";
pub const QUERY_LENGTH_FIELD: &str = "query_length";
pub const QUERY_TYPE_FIELD: &str = "query_type";

/// Why a record was left out of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingEndTime,
    MissingDuration,
    /// End time minus duration falls outside the representable range
    StartOutOfRange,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingEndTime => write!(f, "no `{}` value", END_TIME_FIELD),
            Rejection::MissingDuration => write!(f, "no `{}` value", DURATION_FIELD),
            Rejection::StartOutOfRange => write!(f, "start time out of range"),
        }
    }
}

/// Computes `time_start`, `query_length` and `query_type` for completed records
pub struct Finalizer {}

impl Finalizer {
    pub fn new() -> Self {
        Self {}
    }

    /// Enrich a completed record, or reject it when the end time or the
    /// query duration is missing.
    pub fn finalize(&self, mut record: Record) -> Result<Record, Rejection> {
        let end = record
            .get(END_TIME_FIELD)
            .and_then(FieldValue::as_timestamp)
            .ok_or(Rejection::MissingEndTime)?;
        let duration = record
            .get(DURATION_FIELD)
            .and_then(FieldValue::as_duration)
            .ok_or(Rejection::MissingDuration)?;

        let start = end
            .checked_sub_signed(duration)
            .ok_or(Rejection::StartOutOfRange)?;
        record.insert(TIME_START_FIELD, FieldValue::Timestamp(start));

        let derived = record.query().map(|query| {
            let length = query.chars().count() as i64;
            (length, QueryType::label(query))
        });
        if let Some((length, label)) = derived {
            record.insert(QUERY_LENGTH_FIELD, FieldValue::Integer(length));
            record.insert(QUERY_TYPE_FIELD, FieldValue::Text(label.to_string()));
        }

        Ok(record)
    }
}

impl Default for Finalizer {
    fn default() -> Self {
        Self::new()
    }
}
