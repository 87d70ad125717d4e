//! Unit tests for the slow log parser
//!
//! Tests block segmentation, annotation extraction and query text assembly in isolation

use chrono::{Duration, NaiveDate};
use mysql_slowlog_json::parsers::slowlog::{ParseStats, SlowlogParser};
use mysql_slowlog_json::{FieldValue, ParserConfig, RuleSet, SlowlogError};

fn rules() -> RuleSet {
    RuleSet::standard().unwrap()
}

/// Helper function to build a typical MySQL slow log block
fn block(time: &str, query_time: &str, sql: &[&str]) -> String {
    let mut content = format!(
        "# Time: {}\n# User@Host: app[app] @ localhost []  Id:    7\n# Query_time: {}  Lock_time: 0.000010 Rows_sent: 3  Rows_examined: 300\n",
        time, query_time
    );
    for line in sql {
        content.push_str(line);
        content.push('\n');
    }
    content
}

#[cfg(test)]
mod parser_unit_tests {
    use super::*;

    #[test]
    fn test_parse_single_block() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let records = parser
            .parse_str(&block("230101 10:00:00", "2.5", &["SELECT * FROM t;"]))
            .unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        let expected_time = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(record.get("time"), Some(&FieldValue::Timestamp(expected_time)));
        assert_eq!(record.get("query_time"), Some(&FieldValue::Duration(Duration::milliseconds(2500))));
        assert_eq!(record.get("lock_time"), Some(&FieldValue::Duration(Duration::microseconds(10))));
        assert_eq!(record.get("rows_sent"), Some(&FieldValue::Integer(3)));
        assert_eq!(record.get("rows_examined"), Some(&FieldValue::Integer(300)));
        assert_eq!(record.query(), Some("SELECT * FROM t;\n"));
    }

    #[test]
    fn test_parse_multiple_blocks_in_order() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let mut content = block("230101 10:00:00", "1", &["SELECT 1;"]);
        content.push_str(&block("230101 10:00:01", "2", &["INSERT INTO t VALUES (1);"]));
        content.push_str(&block("230101 10:00:02", "3", &["DELETE FROM t;"]));

        let records = parser.parse_str(&content).unwrap();
        let queries: Vec<&str> = records.iter().filter_map(|r| r.query()).collect();
        assert_eq!(
            queries,
            vec!["SELECT 1;\n", "INSERT INTO t VALUES (1);\n", "DELETE FROM t;\n"]
        );
        assert_eq!(records[1].start_line(), 5);
        assert_eq!(parser.stats().records, 3);
    }

    #[test]
    fn test_multiline_query_keeps_every_fragment() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let records = parser
            .parse_str(&block(
                "230101 10:00:00",
                "0.5",
                &["SELECT u.name, p.title", "FROM users u JOIN posts p ON u.id = p.user_id", "WHERE u.active = 1;"],
            ))
            .unwrap();

        let query = records[0].query().unwrap();
        assert_eq!(
            query,
            "SELECT u.name, p.title\nFROM users u JOIN posts p ON u.id = p.user_id\nWHERE u.active = 1;\n"
        );
    }

    #[test]
    fn test_multiline_query_joined_without_breaks() {
        let rules = rules();
        let config = ParserConfig::default().with_line_breaks(false);
        let mut parser = SlowlogParser::new(&rules, config);
        let records = parser
            .parse_str(&block("230101 10:00:00", "0.5", &["SELECT a", " FROM b", " WHERE c = 1;"]))
            .unwrap();

        assert_eq!(records[0].query(), Some("SELECT a FROM b WHERE c = 1;"));
    }

    #[test]
    fn test_consecutive_markers_produce_separate_records() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let mut content = String::from("# Time: 230101 09:59:59\n");
        content.push_str(&block("230101 10:00:00", "1", &["SELECT 1;"]));

        let records = parser.parse_str(&content).unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].contains("query_time"));
        assert!(records[1].contains("query_time"));
    }

    #[test]
    fn test_all_metric_kinds() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let content = "# Time: 230101 10:00:00\n\
                       # Schema: inventory  Last_errno: 0\n\
                       # Query_time: 0.1  Lock_time: 0.0 Rows_sent: 0  Rows_examined: 0  Rows_affected: 4\n\
                       # Bytes_sent: 11  Tmp_tables: 2  Tmp_disk_tables: 1  Tmp_table_sizes: 4096\n\
                       # QC_Hit: Yes  Full_scan: No  Full_join: Yes  Tmp_table: No  Tmp_table_on_disk: Yes\n\
                       # Filesort: No  Filesort_on_disk: Yes  Merge_passes: 2\n\
                       UPDATE stock SET qty = qty - 1;\n";

        let records = parser.parse_str(content).unwrap();
        let record = &records[0];

        assert_eq!(record.get("schema"), Some(&FieldValue::Text("inventory".to_string())));
        assert_eq!(record.get("rows_affected"), Some(&FieldValue::Integer(4)));
        assert_eq!(record.get("bytes_sent"), Some(&FieldValue::Integer(11)));
        assert_eq!(record.get("tmp_tables"), Some(&FieldValue::Integer(2)));
        assert_eq!(record.get("tmp_disk_tables"), Some(&FieldValue::Integer(1)));
        assert_eq!(record.get("tmp_table_sizes"), Some(&FieldValue::Integer(4096)));
        assert_eq!(record.get("qc_hit"), Some(&FieldValue::Boolean(true)));
        assert_eq!(record.get("full_scan"), Some(&FieldValue::Boolean(false)));
        assert_eq!(record.get("full_join"), Some(&FieldValue::Boolean(true)));
        assert_eq!(record.get("tmp_table"), Some(&FieldValue::Boolean(false)));
        assert_eq!(record.get("tmp_table_on_disk"), Some(&FieldValue::Boolean(true)));
        assert_eq!(record.get("filesort"), Some(&FieldValue::Boolean(false)));
        assert_eq!(record.get("filesort_on_disk"), Some(&FieldValue::Boolean(true)));
        assert_eq!(record.get("merge_passes"), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn test_innodb_metrics() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let content = "# Time: 231231 23:59:59\n\
                       # Query_time: 12.000001  Lock_time: 0.000000  Rows_sent: 5  Rows_examined: 90\n\
                       # InnoDB_IO_r_ops: 3  InnoDB_IO_r_bytes: 49152  InnoDB_IO_r_wait: 0.001250\n\
                       # InnoDB_rec_lock_wait: 0.000000  InnoDB_queue_wait: 0.5\n\
                       # InnoDB_pages_distinct: 7\n\
                       SELECT 1;\n";

        let records = parser.parse_str(content).unwrap();
        let record = &records[0];

        assert_eq!(
            record.get("query_time"),
            Some(&FieldValue::Duration(Duration::seconds(12) + Duration::microseconds(1)))
        );
        assert_eq!(record.get("innodb_io_r_ops"), Some(&FieldValue::Integer(3)));
        assert_eq!(record.get("innodb_io_r_bytes"), Some(&FieldValue::Integer(49152)));
        assert_eq!(record.get("innodb_io_r_wait"), Some(&FieldValue::Duration(Duration::microseconds(1250))));
        assert_eq!(record.get("innodb_rec_lock_wait"), Some(&FieldValue::Duration(Duration::zero())));
        assert_eq!(record.get("innodb_queue_wait"), Some(&FieldValue::Duration(Duration::milliseconds(500))));
        assert_eq!(record.get("innodb_pages_distinct"), Some(&FieldValue::Integer(7)));
    }

    #[test]
    fn test_unparseable_field_is_skipped_by_default() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let content = "# Time: 230101 10:00:00\n\
                       # Query_time: 1.2.3  Lock_time: 0.0 Rows_sent: 1  Rows_examined: 1\n\
                       # Full_scan: Maybe\n\
                       SELECT 1;\n";

        let records = parser.parse_str(content).unwrap();
        assert!(!records[0].contains("query_time"));
        assert!(!records[0].contains("full_scan"));
        assert_eq!(records[0].get("rows_sent"), Some(&FieldValue::Integer(1)));
        assert_eq!(parser.stats().fields_skipped, 2);
    }

    #[test]
    fn test_bad_timestamp_is_skipped_by_default() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let records = parser
            .parse_str("# Time: yesterday\n# Query_time: 1\nSELECT 1;\n")
            .unwrap();

        assert_eq!(records.len(), 1);
        assert!(!records[0].contains("time"));
        assert!(records[0].contains("query_time"));
    }

    #[test]
    fn test_strict_mode_reports_line() {
        let rules = rules();
        let config = ParserConfig::default().with_strict(true);
        let mut parser = SlowlogParser::new(&rules, config);
        let err = parser
            .parse_str("# Time: 230101 10:00:00\n# Rows_sent: 1  Rows_examined: 1\n# Query_time: 1.2.3\n")
            .unwrap_err();

        match err {
            SlowlogError::Parse { line_number, line_content, .. } => {
                assert_eq!(line_number, Some(3));
                assert_eq!(line_content.as_deref(), Some("# Query_time: 1.2.3"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_header_before_first_marker() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let mut content = String::from(
            "/usr/sbin/mysqld, Version: 8.0.33 (MySQL Community Server - GPL). started with:\n\
             Tcp port: 3306  Unix socket: /var/run/mysqld/mysqld.sock\n\
             Time                 Id Command    Argument\n",
        );
        content.push_str(&block("230101 10:00:00", "1", &["SELECT 1;"]));

        let records = parser.parse_str(&content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query(), Some("SELECT 1;\n"));
        assert_eq!(records[0].start_line(), 4);
        assert_eq!(parser.stats().orphan_lines, 3);
    }

    #[test]
    fn test_crlf_line_endings() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        let records = parser
            .parse_str("# Time: 230101 10:00:00\r\n# Query_time: 1  Lock_time: 0\r\nSELECT 1;\r\n")
            .unwrap();

        assert!(records[0].contains("time"));
        assert_eq!(records[0].query(), Some("SELECT 1;\n"));
    }

    #[test]
    fn test_stats() {
        let rules = rules();
        let mut parser = SlowlogParser::new(&rules, ParserConfig::default());
        parser
            .parse_str(&block("230101 10:00:00", "1", &["SELECT 1;", "-- trailing comment"]))
            .unwrap();

        assert_eq!(
            parser.stats(),
            ParseStats {
                lines: 5,
                records: 1,
                fields_skipped: 0,
                orphan_lines: 0,
            }
        );
    }
}
