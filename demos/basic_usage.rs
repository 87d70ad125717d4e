//! Basic usage example for mysql-slowlog-json
//!
//! This example demonstrates how to use the library to parse a slow query
//! log and print each accepted record as a JSON line.

use mysql_slowlog_json::{
    process_reader, Finalizer, JsonFormatter, JsonLinesWriter, ParserConfig, RuleSet, SlowlogParser,
};
use std::io;

const SAMPLE_LOG: &str = "# Time: 230101 10:00:00
# User@Host: app[app] @ localhost []  Id:    17
# Query_time: 2.5  Lock_time: 0.0 Rows_sent: 1  Rows_examined: 10
SELECT * FROM t;
# Time: 230101 10:00:05
# User@Host: app[app] @ localhost []  Id:    18
SELECT 1;
# Time: 230101 10:00:07
# Query_time: 0.75  Lock_time: 0.5 Rows_sent: 0  Rows_examined: 120000
DELETE FROM audit_log
WHERE created_at < '2022-01-01';
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("mysql-slowlog-json Basic Usage Example");
    println!("======================================");

    let rules = RuleSet::standard()?;

    // Step by step: parse, finalize, format
    let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
    let finalizer = Finalizer::new();
    let formatter = JsonFormatter::new().with_pretty(true);

    let records = parser.parse_str(SAMPLE_LOG)?;
    println!("Parsed {} blocks", records.len());

    for record in records {
        let start_line = record.start_line();
        match finalizer.finalize(record) {
            Ok(record) => println!("{}", formatter.format_record(&record)?),
            Err(reason) => println!("Block at line {} dropped: {}", start_line, reason),
        }
    }

    // Or run the whole pipeline into any writer
    println!("\nJSON Lines:");
    let mut writer = JsonLinesWriter::new(io::stdout());
    let stats = process_reader(SAMPLE_LOG.as_bytes(), &rules, ParserConfig::default(), &mut writer)?;
    println!(
        "{} records written, {} dropped",
        stats.records_emitted, stats.records_dropped
    );

    Ok(())
}
