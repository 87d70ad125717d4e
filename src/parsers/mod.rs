//! Slow query log parsing

pub mod fields;
pub mod lines;
pub mod slowlog;

pub use fields::{coerce, match_field, FieldValue};
pub use lines::LogicalLines;
pub use slowlog::{ParseStats, Record, SlowlogParser};
