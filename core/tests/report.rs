use chrono::{NaiveDate, TimeZone, Utc};
use fraud_analytics_core::{
    report::{daily_fraud_report, parse_report_date},
    AnalyticsError, ReportEngine, Transaction, TxnType,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn date_a() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

fn date_b() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
}

/// Twelve frauds on date A (amounts 100..=1200), a large fraud and some
/// clean traffic on date B.
fn two_day_set() -> Vec<Transaction> {
    let mut txns = Vec::new();
    for i in 1..=12i64 {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, (i % 24) as u32, 0, 0).unwrap();
        let txn_type = if i % 2 == 0 {
            TxnType::Transfer
        } else {
            TxnType::CashOut
        };
        txns.push(
            Transaction::new(i, txn_type, i as f64 * 100.0, format!("C{i}"), ts).fraudulent(false),
        );
    }
    let a_noon = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
    txns.push(Transaction::new(13, TxnType::Payment, 5.0, "C50", a_noon));

    let b_noon = Utc.with_ymd_and_hms(2024, 1, 16, 12, 0, 0).unwrap();
    txns.push(Transaction::new(14, TxnType::Transfer, 99_999.0, "C60", b_noon).fraudulent(true));
    txns.push(Transaction::new(15, TxnType::Payment, 10.0, "C61", b_noon));
    txns
}

fn test_engine(run_id: &str) -> ReportEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    ReportEngine::build_test(run_id.into()).unwrap()
}

// ── Daily fraud report ───────────────────────────────────────────────────────

/// The top list holds the ten largest frauds of the day, largest first.
#[test]
fn top_list_is_limited_and_sorted() {
    let report = daily_fraud_report(date_a(), &two_day_set(), 10);

    assert_eq!(report.date, date_a());
    assert_eq!(report.transaction_count, 13);
    assert_eq!(report.fraud_count(), 12);
    assert_eq!(report.top_transactions.len(), 10);

    let amounts: Vec<f64> = report.top_transactions.iter().map(|t| t.amount).collect();
    assert_eq!(amounts[0], 1_200.0);
    assert_eq!(amounts[9], 300.0);
    assert!(
        amounts.windows(2).all(|w| w[0] >= w[1]),
        "amounts must be descending: {amounts:?}"
    );
    assert!(
        report
            .top_transactions
            .iter()
            .all(|t| t.timestamp.date_naive() == date_a() && t.is_fraud),
        "only fraudulent rows from the report date"
    );
}

/// Per-type summary gives fraud count and average amount per type.
#[test]
fn per_type_summary() {
    let report = daily_fraud_report(date_a(), &two_day_set(), 10);

    assert_eq!(report.summary.len(), 2, "PAYMENT had no fraud");
    let transfer = report
        .summary
        .iter()
        .find(|s| s.txn_type == TxnType::Transfer)
        .unwrap();
    // 200, 400, ..., 1200
    assert_eq!(transfer.fraud_count, 6);
    assert_eq!(transfer.average_amount, 700.0);

    let cash_out = report
        .summary
        .iter()
        .find(|s| s.txn_type == TxnType::CashOut)
        .unwrap();
    // 100, 300, ..., 1100
    assert_eq!(cash_out.fraud_count, 6);
    assert_eq!(cash_out.average_amount, 600.0);
}

/// A date with no fraud yields an empty report, not an error.
#[test]
fn date_without_fraud_is_empty() {
    let quiet = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let report = daily_fraud_report(quiet, &two_day_set(), 10);
    assert_eq!(report.transaction_count, 0);
    assert!(report.summary.is_empty());
    assert!(report.top_transactions.is_empty());
}

#[test]
fn report_date_parsing() {
    assert_eq!(parse_report_date("2024-01-15").unwrap(), date_a());
    assert!(matches!(
        parse_report_date("15/01/2024"),
        Err(AnalyticsError::InvalidDate(_))
    ));
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// The engine's daily report reads only the requested day from the store.
#[test]
fn engine_daily_report_from_store() {
    let engine = test_engine("run-daily");
    engine.ingest(&two_day_set()).unwrap();

    let report = engine.daily_fraud_report(date_b()).unwrap();
    assert_eq!(report.transaction_count, 2);
    assert_eq!(report.fraud_count(), 1);
    assert_eq!(report.top_transactions[0].amount, 99_999.0);
    assert_eq!(report.top_transactions[0].origin_id, "C60");
}

/// A completed run is recorded with its summary JSON.
#[test]
fn run_summary_is_recorded() {
    let engine = test_engine("run-summary");
    engine.ingest(&two_day_set()).unwrap();

    let summary = engine.run_summary().unwrap();
    assert_eq!(summary.transaction_count, 15);
    assert_eq!(summary.fraud_count, 13);
    assert_eq!(summary.segment_population.len(), 4);

    let record = engine
        .store
        .get_run("run-summary")
        .unwrap()
        .expect("run must be recorded");
    assert_eq!(record.status, "completed");
    assert_eq!(record.input_rows, 15);
    assert!(record.completed_at.is_some());
    let json = record.summary_json.unwrap();
    assert!(json.contains("\"transaction_count\":15"), "json: {json}");

    engine.run_summary().unwrap();
    assert_eq!(
        engine.store.run_count("completed").unwrap(),
        1,
        "re-running the same id updates the record"
    );
}

/// The high-risk query needs no parameters and is sorted by fraud total.
#[test]
fn engine_high_risk_customers() {
    let engine = test_engine("run-risk");
    let ts = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
    let mut txns = Vec::new();
    for (id, origin, amount) in [
        (1, "A", 100.0),
        (2, "A", 200.0),
        (3, "A", 300.0),
        (4, "B", 1_000.0),
        (5, "B", 1_000.0),
        (6, "C", 500.0),
        (7, "C", 500.0),
        (8, "C", 500.0),
    ] {
        txns.push(Transaction::new(id, TxnType::CashOut, amount, origin, ts).fraudulent(false));
    }
    engine.ingest(&txns).unwrap();

    let ids: Vec<String> = engine
        .high_risk_customers()
        .unwrap()
        .into_iter()
        .map(|c| c.customer_id)
        .collect();
    assert_eq!(ids, vec!["C".to_string(), "A".to_string()]);
}

/// `build` loads config from the data directory and migrates the store.
#[test]
fn engine_build_reads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("analytics");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("analytics_config.json"),
        r#"{ "fraud": { "discrepancy_tolerance": 1.0,
              "discrepancy_types": ["CASH_OUT"],
              "high_risk_min_fraud_count": 2, "top_fraud_limit": 1 } }"#,
    )
    .unwrap();

    let store = fraud_analytics_core::store::TxnStore::in_memory().unwrap();
    let engine = ReportEngine::build(store, dir.path().to_str().unwrap()).unwrap();
    assert_eq!(engine.config.fraud.top_fraud_limit, 1);
    engine.ingest(&two_day_set()).unwrap();

    let report = engine.daily_fraud_report(date_a()).unwrap();
    assert_eq!(report.top_transactions.len(), 1);
    assert_eq!(report.top_transactions[0].amount, 1_200.0);

    let missing = tempfile::tempdir().unwrap();
    let store = fraud_analytics_core::store::TxnStore::in_memory().unwrap();
    assert!(ReportEngine::build(store, missing.path().to_str().unwrap()).is_err());
}
