//! Drives one input through parsing, finalization and output

use crate::config::ParserConfig;
use crate::error::{Result, SlowlogError};
use crate::finalize::Finalizer;
use crate::output::RecordSink;
use crate::parsers::{LogicalLines, Record, SlowlogParser};
use crate::rules::RuleSet;
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Summary of one conversion run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub lines: usize,
    pub records_emitted: usize,
    /// Records missing the end time or query duration
    pub records_dropped: usize,
    pub fields_skipped: usize,
    /// Lines discarded because they came before the first record
    pub orphan_lines: usize,
}

impl RunStats {
    pub fn merge(&mut self, other: &RunStats) {
        self.lines += other.lines;
        self.records_emitted += other.records_emitted;
        self.records_dropped += other.records_dropped;
        self.fields_skipped += other.fields_skipped;
        self.orphan_lines += other.orphan_lines;
    }
}

/// Convert every record in `reader` and hand it to `sink`, in input order
pub fn process_reader<R, S>(reader: R, rules: &RuleSet, config: ParserConfig, sink: &mut S) -> Result<RunStats>
where
    R: BufRead,
    S: RecordSink + ?Sized,
{
    process_reader_with_progress(reader, rules, config, sink, |_| {})
}

/// Like [`process_reader`], calling `progress` with the running count of
/// emitted records after each one is written
pub fn process_reader_with_progress<R, S, F>(
    reader: R,
    rules: &RuleSet,
    config: ParserConfig,
    sink: &mut S,
    mut progress: F,
) -> Result<RunStats>
where
    R: BufRead,
    S: RecordSink + ?Sized,
    F: FnMut(usize),
{
    let mut parser = SlowlogParser::new(rules, config);
    let finalizer = Finalizer::new();
    let mut stats = RunStats::default();

    let mut handle = |record: Record, stats: &mut RunStats| -> Result<()> {
        let start_line = record.start_line();
        match finalizer.finalize(record) {
            Ok(record) => {
                sink.emit(&record)?;
                stats.records_emitted += 1;
                progress(stats.records_emitted);
            }
            Err(reason) => {
                debug!("Dropping record started at line {}: {}", start_line, reason);
                stats.records_dropped += 1;
            }
        }
        Ok(())
    };

    for line in LogicalLines::new(reader) {
        let (line_number, line) = line?;
        if let Some(record) = parser.feed_line(line_number, &line)? {
            handle(record, &mut stats)?;
        }
    }
    if let Some(record) = parser.finish() {
        handle(record, &mut stats)?;
    }
    sink.flush()?;

    let parsed = parser.stats();
    stats.lines = parsed.lines;
    stats.fields_skipped = parsed.fields_skipped;
    stats.orphan_lines = parsed.orphan_lines;

    Ok(stats)
}

/// Open `path` and convert it
pub fn process_file<S>(path: &Path, rules: &RuleSet, config: ParserConfig, sink: &mut S) -> Result<RunStats>
where
    S: RecordSink + ?Sized,
{
    process_file_with_progress(path, rules, config, sink, |_| {})
}

pub fn process_file_with_progress<S, F>(
    path: &Path,
    rules: &RuleSet,
    config: ParserConfig,
    sink: &mut S,
    progress: F,
) -> Result<RunStats>
where
    S: RecordSink + ?Sized,
    F: FnMut(usize),
{
    let file = File::open(path).map_err(|e| {
        SlowlogError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open {}: {}", path.display(), e),
        ))
    })?;

    let stats = process_reader_with_progress(BufReader::new(file), rules, config, sink, progress)?;
    info!(
        "{}: {} lines, {} records written, {} dropped, {} fields skipped",
        path.display(),
        stats.lines,
        stats.records_emitted,
        stats.records_dropped,
        stats.fields_skipped
    );
    Ok(stats)
}
