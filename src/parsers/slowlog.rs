//! Slow query log parser
//!
//! Splits the log into one block per query. A block starts at a `# Time:`
//! line; every following line either carries metric annotations (`# ` prefix)
//! or is part of the SQL text.

use crate::config::ParserConfig;
use crate::error::Result;
use crate::parsers::fields::{coerce, match_field, FieldValue};
use crate::parsers::lines::LogicalLines;
use crate::rules::RuleSet;
use log::{debug, warn};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::io::BufRead;

/// Line prefix that starts a new query block
pub const RECORD_START_MARKER: &str = "# Time: ";
/// Prefix of metric annotation lines
pub const ANNOTATION_PREFIX: &str = "# ";
/// Record key holding the accumulated SQL text
pub const QUERY_FIELD: &str = "query";

/// Structured form of one logged query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
    start_line: usize,
}

impl Record {
    pub fn new(start_line: usize) -> Self {
        Self {
            fields: BTreeMap::new(),
            start_line,
        }
    }

    /// Line number of the `# Time:` line that opened this record
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(key.into(), value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    /// Accumulated SQL text, if any query line was seen
    pub fn query(&self) -> Option<&str> {
        self.get(QUERY_FIELD).and_then(FieldValue::as_text)
    }

    /// Append one line of SQL text
    pub fn append_query(&mut self, line: &str, line_break: bool) {
        let entry = self
            .fields
            .entry(QUERY_FIELD.to_string())
            .or_insert_with(|| FieldValue::Text(String::new()));

        // The query key is only ever written here, so it always holds text
        if let FieldValue::Text(query) = entry {
            query.push_str(line);
            if line_break {
                query.push('\n');
            }
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Counters collected while parsing one input
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    /// Completed, non-empty blocks handed out
    pub records: usize,
    /// Annotation values dropped because they failed to convert
    pub fields_skipped: usize,
    /// Non-blank lines seen before the first `# Time:` marker
    pub orphan_lines: usize,
}

#[derive(Debug)]
enum State {
    Idle,
    Accumulating(Record),
}

/// Record segmenter and builder
///
/// Feed it lines in order; it returns the previous record whenever a new
/// `# Time:` block begins. Call [`SlowlogParser::finish`] at end of input to
/// collect the last one.
pub struct SlowlogParser<'r> {
    rules: &'r RuleSet,
    config: ParserConfig,
    state: State,
    stats: ParseStats,
}

impl<'r> SlowlogParser<'r> {
    pub fn new(rules: &'r RuleSet, config: ParserConfig) -> Self {
        Self {
            rules,
            config,
            state: State::Idle,
            stats: ParseStats::default(),
        }
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Process one complete line.
    ///
    /// Returns the record that was in progress when `line` opens a new block.
    /// In strict mode a field that fails to convert is returned as an error.
    pub fn feed_line(&mut self, line_number: usize, line: &str) -> Result<Option<Record>> {
        self.stats.lines += 1;

        let mut completed = None;
        if line.starts_with(RECORD_START_MARKER) {
            let previous = std::mem::replace(&mut self.state, State::Accumulating(Record::new(line_number)));
            if let State::Accumulating(record) = previous {
                completed = self.complete(record);
            }
        }

        match &mut self.state {
            State::Idle => {
                if !line.trim().is_empty() {
                    self.stats.orphan_lines += 1;
                    if self.stats.orphan_lines == 1 {
                        warn!("Line {}: content before the first `# Time:` line is discarded", line_number);
                    } else {
                        debug!("Line {}: discarding content before first record", line_number);
                    }
                }
            }
            State::Accumulating(record) => {
                build_line(self.rules, &self.config, &mut self.stats, record, line_number, line)?;
            }
        }

        Ok(completed)
    }

    /// Flush the record still in progress at end of input
    pub fn finish(&mut self) -> Option<Record> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Accumulating(record) => self.complete(record),
            State::Idle => None,
        }
    }

    /// Parse a whole reader, returning every completed record in order
    pub fn parse_reader<R: BufRead>(&mut self, reader: R) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for line in LogicalLines::new(reader) {
            let (line_number, line) = line?;
            if let Some(record) = self.feed_line(line_number, &line)? {
                records.push(record);
            }
        }
        records.extend(self.finish());
        Ok(records)
    }

    /// Parse an in-memory log
    pub fn parse_str(&mut self, content: &str) -> Result<Vec<Record>> {
        self.parse_reader(content.as_bytes())
    }

    fn complete(&mut self, record: Record) -> Option<Record> {
        if record.is_empty() {
            return None;
        }
        debug!(
            "Completed record started at line {} with {} fields",
            record.start_line(),
            record.len()
        );
        self.stats.records += 1;
        Some(record)
    }
}

fn build_line(
    rules: &RuleSet,
    config: &ParserConfig,
    stats: &mut ParseStats,
    record: &mut Record,
    line_number: usize,
    line: &str,
) -> Result<()> {
    if !line.starts_with(ANNOTATION_PREFIX) {
        record.append_query(line, config.preserve_line_breaks);
        // Every rule pattern is anchored on the annotation prefix
        return Ok(());
    }

    for rule in rules {
        let Some(raw) = match_field(line, rule) else {
            continue;
        };

        match coerce(raw, rule) {
            Ok(value) => {
                record.insert(rule.key.clone(), value);
            }
            Err(e) if config.strict || !e.is_coercion_error() => return Err(e.at_line(line_number, line)),
            Err(e) => {
                stats.fields_skipped += 1;
                warn!("Line {}: skipping {}: {}", line_number, rule.field_name, e);
            }
        }
    }

    Ok(())
}
