//! SQL text helpers

pub mod query;

pub use query::QueryType;
