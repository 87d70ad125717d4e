//! Output formatting for converted records

pub mod json;

pub use json::{present, JsonFormatter, JsonLinesWriter, RecordSink};
