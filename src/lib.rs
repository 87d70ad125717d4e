//! mysql-slowlog-json - MySQL slow query log to JSON Lines converter
//!
//! This library splits a slow query log into one record per logged query,
//! extracts the typed metrics from the `# ` annotation lines, derives the
//! query start time, length and type, and writes each record as a JSON object.

pub mod config;
pub mod error;
pub mod finalize;
pub mod output;
pub mod parsers;
pub mod pipeline;
pub mod rules;
pub mod sql;

// Re-export commonly used items
pub use config::{OutputTarget, ParserConfig};
pub use error::{parse_error, timestamp_error, Result, SlowlogError};
pub use finalize::{Finalizer, Rejection};
pub use output::{JsonFormatter, JsonLinesWriter, RecordSink};
pub use parsers::{FieldValue, Record, SlowlogParser};
pub use pipeline::{process_file, process_reader, RunStats};
pub use rules::{RuleSet, ValueKind};
pub use sql::QueryType;
