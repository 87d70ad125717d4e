//! Declarative table of slow log metric fields and the patterns that recognise them

use crate::error::{config_error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Field holding the time a query finished
pub const END_TIME_FIELD: &str = "time";
/// Field holding the query execution time
pub const DURATION_FIELD: &str = "query_time";

/// Metric fields understood by default, as `(field name, kind)` pairs
pub const DEFAULT_RULES: &[(&str, &str)] = &[
    ("Time", "datetime"),
    ("Schema", "string"),
    ("Query_time", "duration"),
    ("Lock_time", "duration"),
    ("Rows_sent", "integer"),
    ("Rows_examined", "integer"),
    ("Rows_affected", "integer"),
    ("Rows_read", "integer"),
    ("Bytes_sent", "integer"),
    ("Tmp_tables", "integer"),
    ("Tmp_disk_tables", "integer"),
    ("Tmp_table_sizes", "integer"),
    ("QC_Hit", "boolean"),
    ("Full_scan", "boolean"),
    ("Full_join", "boolean"),
    ("Tmp_table", "boolean"),
    ("Tmp_table_on_disk", "boolean"),
    ("Filesort", "boolean"),
    ("Filesort_on_disk", "boolean"),
    ("Merge_passes", "integer"),
    ("InnoDB_IO_r_ops", "integer"),
    ("InnoDB_IO_r_bytes", "integer"),
    ("InnoDB_IO_r_wait", "duration"),
    ("InnoDB_rec_lock_wait", "duration"),
    ("InnoDB_queue_wait", "duration"),
    ("InnoDB_pages_distinct", "integer"),
];

/// Kind of value a metric field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `YYMMDD HH:MM:SS` timestamp
    Datetime,
    /// Single word
    String,
    /// Seconds, fractional part allowed
    Duration,
    Integer,
    /// `Yes` or `No`
    Boolean,
}

impl ValueKind {
    /// Pattern capturing the raw value text for this kind.
    ///
    /// Word and digit classes are ASCII only: a non-ASCII digit is not a match
    /// and `Schema: café` captures `caf`.
    pub fn pattern(&self) -> &'static str {
        match self {
            ValueKind::Datetime => r".*",
            ValueKind::String => r"(?-u:\w)+",
            ValueKind::Duration => r"[0-9.]+",
            ValueKind::Integer => r"[0-9]+",
            ValueKind::Boolean => r"(?-u:\w)+",
        }
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "datetime" => Ok(ValueKind::Datetime),
            "string" => Ok(ValueKind::String),
            "duration" | "time" => Ok(ValueKind::Duration),
            "integer" | "int" => Ok(ValueKind::Integer),
            "boolean" | "bool" => Ok(ValueKind::Boolean),
            other => Err(format!("unknown rule kind: {}", other)),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Datetime => write!(f, "datetime"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Duration => write!(f, "duration"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// One recognisable metric field
#[derive(Debug, Clone)]
pub struct Rule {
    /// Name as written in the log, e.g. `Rows_sent`
    pub field_name: String,
    /// Lowercase name used as the record key
    pub key: String,
    pub kind: ValueKind,
    pub pattern: Regex,
}

impl Rule {
    pub fn new(field_name: &str, kind: ValueKind) -> Result<Self> {
        let source = format!(r"^# .*{}: ({})", regex::escape(field_name), kind.pattern());
        let pattern = Regex::new(&source)
            .map_err(|e| config_error(format!("invalid pattern for {}: {}", field_name, e), Some(field_name)))?;

        Ok(Self {
            field_name: field_name.to_string(),
            key: field_name.to_lowercase(),
            kind,
            pattern,
        })
    }
}

/// Immutable set of compiled rules, built once and shared by reference
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile a rule table. Unknown kinds and duplicate field names are rejected.
    pub fn from_table(table: &[(&str, &str)]) -> Result<Self> {
        let mut rules: Vec<Rule> = Vec::with_capacity(table.len());

        for &(field_name, kind) in table {
            let kind = kind
                .parse::<ValueKind>()
                .map_err(|message| config_error(message, Some(field_name)))?;

            if rules.iter().any(|r| r.field_name == field_name) {
                return Err(config_error(
                    format!("field {} is declared more than once", field_name),
                    Some(field_name),
                ));
            }

            rules.push(Rule::new(field_name, kind)?);
        }

        log::debug!("Compiled {} slow log rules", rules.len());
        Ok(Self { rules })
    }

    /// Rules for the standard MySQL/MariaDB slow log fields
    pub fn standard() -> Result<Self> {
        Self::from_table(DEFAULT_RULES)
    }

    pub fn get(&self, field_name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.field_name == field_name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
