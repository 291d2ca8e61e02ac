use chrono::{TimeZone, Utc};
use fraud_analytics_core::{
    export::{export_to_path, read_customer_segments, render_records, write_records},
    fraud_scorer::{fraud_patterns, FraudPattern},
    segmentation::{CustomerSegment, Segment},
    ReportEngine, Transaction, TxnType,
};
use std::fs;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn segments() -> Vec<CustomerSegment> {
    vec![
        CustomerSegment {
            customer_id: "C1".into(),
            segment: Segment::Platinum,
            total_amount: 2_500_000.0,
        },
        CustomerSegment {
            customer_id: "C2".into(),
            segment: Segment::Silver,
            total_amount: 150_000.5,
        },
        CustomerSegment {
            customer_id: "C3".into(),
            segment: Segment::Standard,
            total_amount: 12.25,
        },
    ]
}

fn engine_with_data() -> ReportEngine {
    let engine = ReportEngine::build_test("run-export".into()).unwrap();
    let ts = Utc.with_ymd_and_hms(2024, 4, 2, 3, 0, 0).unwrap();
    engine
        .ingest(&[
            Transaction::new(0, TxnType::Transfer, 600_000.0, "C1", ts).fraudulent(true),
            Transaction::new(0, TxnType::Payment, 120.0, "C2", ts),
            Transaction::new(0, TxnType::CashOut, 2_000.0, "C3", ts).fraudulent(false),
        ])
        .unwrap();
    engine
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// An exported segment file reads back to the same (customer, segment) pairs.
#[test]
fn customer_segments_round_trip() {
    let original = segments();
    let bytes = render_records(&original, b',').unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(
        text.starts_with("customerId,segment,totalAmount\n"),
        "header first: {text}"
    );

    let back = read_customer_segments(bytes.as_slice(), b',').unwrap();
    let pairs: Vec<(String, Segment)> = back
        .iter()
        .map(|s| (s.customer_id.clone(), s.segment))
        .collect();
    let expected: Vec<(String, Segment)> = original
        .iter()
        .map(|s| (s.customer_id.clone(), s.segment))
        .collect();
    assert_eq!(pairs, expected);
}

/// An empty result still produces a header row.
#[test]
fn empty_set_writes_header_only() {
    let mut buf = Vec::new();
    let written = write_records::<_, FraudPattern>(&mut buf, &[], b',').unwrap();
    assert_eq!(written, 0);
    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "type,hour,amount,oldBalanceOrig,newBalanceOrig\n"
    );
}

/// Fraud pattern rows carry only fraudulent transactions.
#[test]
fn fraud_patterns_rows() {
    let ts = Utc.with_ymd_and_hms(2024, 4, 2, 17, 5, 0).unwrap();
    let txns = vec![
        Transaction::new(1, TxnType::CashOut, 250.0, "C1", ts)
            .with_balances(250.0, 0.0)
            .fraudulent(false),
        Transaction::new(2, TxnType::Payment, 9.0, "C2", ts),
    ];
    let bytes = render_records(&fraud_patterns(&txns), b',').unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2, "header plus one fraud row");
    assert_eq!(lines[1], "CASH_OUT,17,250.0,250.0,0.0");
}

/// A configured delimiter is used for header and rows alike.
#[test]
fn custom_delimiter() {
    let bytes = render_records(&segments()[..1], b';').unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert_eq!(
        text,
        "customerId;segment;totalAmount\nC1;Platinum;2500000.0\n"
    );
    let back = read_customer_segments(bytes.as_slice(), b';').unwrap();
    assert_eq!(back, segments()[..1].to_vec());
}

/// Exporting into a directory that does not exist fails and leaves nothing behind.
#[test]
fn failed_export_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no_such_dir").join("customer_segments.csv");

    let result = export_to_path(&missing, &segments(), b',');
    assert!(result.is_err(), "writing under a missing directory must fail");
    assert!(!missing.exists());
    assert!(!dir.path().join("no_such_dir").exists());
}

/// A successful export replaces the destination and removes its temp file.
#[test]
fn export_replaces_destination_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customer_segments.csv");
    fs::write(&path, "stale contents\n").unwrap();

    let rows = export_to_path(&path, &segments(), b',').unwrap();
    assert_eq!(rows, 3);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("customerId,segment,totalAmount"));
    assert!(!text.contains("stale"));

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty(), "temp file must not survive");
}

/// export_all writes both files into a fresh output directory.
#[test]
fn export_all_writes_both_files() {
    let engine = engine_with_data();
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("reports");

    let outcome = engine.export_all(&out_dir).unwrap();
    assert_eq!(outcome.customer_segments_rows, 3);
    assert_eq!(outcome.fraud_patterns_rows, 2);

    let segments_file = fs::File::open(&outcome.customer_segments_path).unwrap();
    let segments = read_customer_segments(segments_file, b',').unwrap();
    let c1 = segments.iter().find(|s| s.customer_id == "C1").unwrap();
    assert_eq!(c1.segment, Segment::Gold);

    let patterns = fs::read_to_string(&outcome.fraud_patterns_path).unwrap();
    assert_eq!(patterns.lines().count(), 3, "header plus two fraud rows");
    assert!(patterns.lines().skip(1).all(|l| l.contains(",3,")));
}

/// If the second file cannot be placed, the first keeps its old contents.
#[test]
fn export_all_is_all_or_nothing() {
    let engine = engine_with_data();
    let dir = tempfile::tempdir().unwrap();
    let segments_path = dir.path().join("customer_segments.csv");
    fs::write(&segments_path, "previous contents\n").unwrap();
    fs::create_dir(dir.path().join("fraud_patterns.csv")).unwrap();

    assert!(
        engine.export_all(dir.path()).is_err(),
        "a directory in place of fraud_patterns.csv must fail the export"
    );
    assert_eq!(
        fs::read_to_string(&segments_path).unwrap(),
        "previous contents\n"
    );

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["customer_segments.csv".to_string(), "fraud_patterns.csv".to_string()],
        "no staged or backup files survive"
    );
}

/// A failed pair export does not leave a new first file behind.
#[test]
fn failed_export_all_creates_neither_file() {
    let engine = engine_with_data();
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("fraud_patterns.csv")).unwrap();

    assert!(engine.export_all(dir.path()).is_err());
    assert!(!dir.path().join("customer_segments.csv").exists());
}
