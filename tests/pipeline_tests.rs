mod common;

use common::{CollectingExporter, create_gz_csvlog, create_test_csvlog, csvlog_line};
use csvlog_analysis::config::QueryTransform;
use csvlog_analysis::csvlog::pipeline::{PipelineOptions, process_file};
use csvlog_analysis::error::CsvlogError;
use csvlog_analysis::error_writer::ErrorWriter;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

#[test]
fn test_statement_and_duration_merged() {
    let dir = TempDir::new().unwrap();
    let content = [
        csvlog_line("65a4f1e0.4d2", 1, "statement: SELECT *\n  FROM orders\n  WHERE id = 42"),
        csvlog_line("65a4f1e0.4d3", 1, "connection authorized: user=postgres"),
        csvlog_line("65a4f1e0.4d2", 2, "duration: 12.345 ms"),
    ]
    .concat();
    let path = create_test_csvlog(&dir, "postgresql.csv", &content);

    let options = PipelineOptions {
        transform: QueryTransform::Canonicalize,
        correlate_sessions: true,
        ..Default::default()
    };
    let sink = CollectingExporter::default();
    let summary =
        process_file(&path, &options, &sink, None, &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.records_read, 3);
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.merged, 1);

    let records = sink.records();
    assert_eq!(records[0].message, "connection authorized: user=postgres");
    assert_eq!(
        records[1].message,
        "duration: ? ms statement: select * from orders where id = ?"
    );
    assert_eq!(records[1].session_line_num, "1");
    assert!(records[1].parsed_log_time.is_some());
}

#[test]
fn test_gzip_input() {
    let dir = TempDir::new().unwrap();
    let content = [
        csvlog_line("A", 1, "statement: select 1"),
        csvlog_line("A", 2, "statement: select 2"),
    ]
    .concat();
    let path = create_gz_csvlog(&dir, "postgresql.csv.gz", &content);

    let sink = CollectingExporter::default();
    let summary = process_file(
        &path,
        &PipelineOptions::default(),
        &sink,
        None,
        &AtomicBool::new(false),
    )
    .unwrap();
    assert_eq!(summary.records_written, 2);
    assert_eq!(sink.messages(), vec!["statement: select 1", "statement: select 2"]);
}

#[test]
fn test_skipped_records_reported() {
    let dir = TempDir::new().unwrap();
    let bad_time = csvlog_line("A", 2, "statement: select 2")
        .replace("2024-01-15 10:00:00.123 UTC", "15/01/2024 10:00");
    let content = format!(
        "{}only,three,fields\n{}{}",
        csvlog_line("A", 1, "statement: select 1"),
        bad_time,
        csvlog_line("A", 3, "SELECT 'unterminated"),
    );
    let path = create_test_csvlog(&dir, "postgresql.csv", &content);
    let errors_path = dir.path().join("errors.jsonl");
    let errors = ErrorWriter::new(&errors_path).unwrap();

    let options = PipelineOptions {
        transform: QueryTransform::Canonicalize,
        ..Default::default()
    };
    let sink = CollectingExporter::default();
    let summary = process_file(
        &path,
        &options,
        &sink,
        Some(&errors),
        &AtomicBool::new(false),
    )
    .unwrap();

    assert_eq!(summary.records_read, 4);
    assert_eq!(summary.decode_errors, 1);
    assert_eq!(summary.timestamp_errors, 1);
    assert_eq!(summary.canonicalize_errors, 1);
    assert_eq!(sink.messages(), vec!["statement: select ?", "select ?"]);

    drop(errors);
    let content = std::fs::read_to_string(&errors_path).unwrap();
    let entries: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let kinds: Vec<&str> = entries.iter().map(|e| e["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["decode", "timestamp", "canonicalize"]);
    assert_eq!(entries[0]["record"], 2);
    assert_eq!(entries[0]["line"], 2);
    assert_eq!(entries[0]["raw"], "only,three,fields");
    assert_eq!(entries[2]["raw"], "SELECT 'unterminated");
}

#[test]
fn test_filter_applies_after_merge() {
    let dir = TempDir::new().unwrap();
    let content = [
        csvlog_line("A", 1, "statement: select 1"),
        csvlog_line("B", 1, "statement: select 2"),
        csvlog_line("A", 2, "duration: 1.0 ms"),
    ]
    .concat();
    let path = create_test_csvlog(&dir, "postgresql.csv", &content);

    let options = PipelineOptions {
        filter_session_id: Some("A".into()),
        correlate_sessions: true,
        ..Default::default()
    };
    let sink = CollectingExporter::default();
    let summary =
        process_file(&path, &options, &sink, None, &AtomicBool::new(false)).unwrap();

    assert_eq!(sink.messages(), vec!["duration: 1.0 ms statement: select 1"]);
    // B 的语句在文件结束时输出，再被过滤掉
    assert_eq!(summary.filtered, 1);
}

#[test]
fn test_missing_file() {
    let sink = CollectingExporter::default();
    let err = process_file(
        std::path::Path::new("/no/such/postgresql.csv"),
        &PipelineOptions::default(),
        &sink,
        None,
        &AtomicBool::new(false),
    )
    .unwrap_err();
    assert!(matches!(err, CsvlogError::Open { .. }));
    assert!(!err.is_fatal());
}
