//! JSON Lines output for converted slow log records

use crate::config::OutputTarget;
use crate::error::Result;
use crate::parsers::{FieldValue, Record};
use chrono::{Duration, NaiveDateTime, Timelike};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS.ffffffff`
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    format!("{}.{:08}", ts.format("%Y-%m-%d %H:%M:%S"), ts.nanosecond() / 10)
}

/// Render a duration as fractional seconds
pub fn duration_seconds(d: &Duration) -> f64 {
    d.num_seconds() as f64 + f64::from(d.subsec_nanos()) / 1e9
}

/// Convert a typed value into its JSON scalar form
pub fn present_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Timestamp(ts) => Value::String(format_timestamp(ts)),
        FieldValue::Duration(d) => Value::from(duration_seconds(d)),
        FieldValue::Integer(i) => Value::from(*i),
        FieldValue::Boolean(b) => Value::Bool(*b),
        FieldValue::Text(s) => Value::String(s.clone()),
    }
}

/// Timestamps and durations serialize in their display form
impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Timestamp(ts) => serializer.serialize_str(&format_timestamp(ts)),
            FieldValue::Duration(d) => serializer.serialize_f64(duration_seconds(d)),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Convert a finalized record into a JSON object with sorted keys
pub fn present(record: &Record) -> Map<String, Value> {
    record
        .iter()
        .map(|(key, value)| (key.clone(), present_value(value)))
        .collect()
}

/// JSON formatter for finalized records
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter producing one compact object per line
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Multi-line output for human inspection; not valid JSON Lines
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn format_record(&self, record: &Record) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(record)?
        } else {
            serde_json::to_string(record)?
        };
        Ok(text)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Destination for finalized records
pub trait RecordSink {
    fn emit(&mut self, record: &Record) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects presented records in memory
impl RecordSink for Vec<Map<String, Value>> {
    fn emit(&mut self, record: &Record) -> Result<()> {
        self.push(present(record));
        Ok(())
    }
}

/// Writes one JSON object per line
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    formatter: JsonFormatter,
    written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            formatter: JsonFormatter::new(),
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesWriter<Box<dyn Write>> {
    /// Open the target for appending, creating the file if needed
    pub fn open(target: &OutputTarget) -> Result<Self> {
        let writer: Box<dyn Write> = match target {
            OutputTarget::Stdout => Box::new(BufWriter::new(io::stdout())),
            OutputTarget::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Box::new(BufWriter::new(file))
            }
        };
        Ok(Self::new(writer))
    }
}

impl<W: Write> RecordSink for JsonLinesWriter<W> {
    fn emit(&mut self, record: &Record) -> Result<()> {
        let line = self.formatter.format_record(record)?;
        writeln!(self.writer, "{}", line)?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
