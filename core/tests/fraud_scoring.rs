use chrono::{TimeZone, Utc};
use fraud_analytics_core::{
    config::FraudRules,
    fraud_scorer::{
        balance_discrepancies, check_balance, flag_effectiveness, flagged_discrepancies,
        fraud_by_hour, fraud_patterns, fraud_rates, high_risk_customers,
    },
    synth::{SyntheticConfig, SyntheticGenerator},
    Transaction, TxnType,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn txn(id: i64, t: TxnType, amount: f64, origin: &str) -> Transaction {
    let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
    Transaction::new(id, t, amount, origin, ts)
}

fn fraud(id: i64, amount: f64, origin: &str) -> Transaction {
    txn(id, TxnType::Transfer, amount, origin).fraudulent(false)
}

// ── Fraud rate ───────────────────────────────────────────────────────────────

/// Rates are percentages of each type group and stay within [0, 100].
#[test]
fn fraud_rate_bounds_and_values() {
    let txns = vec![
        fraud(1, 1_000.0, "C1"),
        txn(2, TxnType::Transfer, 10.0, "C2"),
        txn(3, TxnType::Transfer, 10.0, "C3"),
        txn(4, TxnType::Transfer, 10.0, "C4"),
        txn(5, TxnType::Payment, 5.0, "C5"),
    ];
    let rates = fraud_rates(&txns);

    assert_eq!(rates.len(), 2);
    let transfer = &rates[0];
    assert_eq!(transfer.txn_type, TxnType::Transfer);
    assert_eq!(transfer.total_count, 4);
    assert_eq!(transfer.fraud_count, 1);
    assert_eq!(transfer.fraud_rate, 25.0);
    assert_eq!(transfer.avg_fraud_amount, Some(1_000.0));

    let payment = &rates[1];
    assert_eq!(payment.fraud_rate, 0.0);
    assert_eq!(
        payment.avg_fraud_amount, None,
        "no fraud means no fraud average"
    );

    let generated = SyntheticGenerator::new(SyntheticConfig {
        seed: 11,
        transactions: 2_000,
        fraud_share: 0.1,
        ..SyntheticConfig::default()
    })
    .generate();
    for rate in fraud_rates(&generated) {
        assert!(
            (0.0..=100.0).contains(&rate.fraud_rate),
            "{:?} rate out of range: {}",
            rate.txn_type,
            rate.fraud_rate
        );
    }
}

// ── Balance discrepancy ──────────────────────────────────────────────────────

/// 1000 - 400 leaves 600: no discrepancy. Reporting 550 is 50 short and flagged.
#[test]
fn discrepancy_is_flagged_beyond_tolerance() {
    let rules = FraudRules::default();

    let consistent = txn(1, TxnType::CashOut, 400.0, "C1").with_balances(1_000.0, 600.0);
    let d = check_balance(&consistent, &rules).expect("CASH_OUT is checked");
    assert_eq!(d.expected_balance, 600.0);
    assert_eq!(d.discrepancy, 0.0);
    assert!(!d.flagged);

    let short = txn(2, TxnType::CashOut, 400.0, "C1").with_balances(1_000.0, 550.0);
    let d = check_balance(&short, &rules).expect("CASH_OUT is checked");
    assert_eq!(d.discrepancy, -50.0);
    assert!(d.flagged, "a 50 unit gap exceeds the 1.0 tolerance");

    let within = txn(3, TxnType::Transfer, 400.0, "C1").with_balances(1_000.0, 600.5);
    assert!(!check_balance(&within, &rules).unwrap().flagged);
}

/// Only configured types are checked.
#[test]
fn discrepancy_ignores_unchecked_types() {
    let rules = FraudRules::default();
    let txns = vec![
        txn(1, TxnType::Payment, 400.0, "C1").with_balances(1_000.0, 0.0),
        txn(2, TxnType::CashIn, 400.0, "C1").with_balances(1_000.0, 1_400.0),
        txn(3, TxnType::Transfer, 400.0, "C1").with_balances(1_000.0, 0.0),
        txn(4, TxnType::CashOut, 100.0, "C2").with_balances(500.0, 400.0),
    ];

    let all = balance_discrepancies(&txns, &rules);
    assert_eq!(all.len(), 2, "only TRANSFER and CASH_OUT are checked");
    let flagged = flagged_discrepancies(&txns, &rules);
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].txn_id, 3);
    assert_eq!(flagged[0].discrepancy, -600.0);
}

// ── High-risk customers ──────────────────────────────────────────────────────

/// Three or more frauds qualifies; two does not. Sorted by total fraud amount.
#[test]
fn high_risk_threshold_and_order() {
    let txns = vec![
        fraud(1, 100.0, "A"),
        fraud(2, 200.0, "A"),
        fraud(3, 300.0, "A"),
        fraud(4, 1_000.0, "B"),
        fraud(5, 1_000.0, "B"),
        fraud(6, 50.0, "C"),
        fraud(7, 50.0, "C"),
        fraud(8, 50.0, "C"),
        fraud(9, 50.0, "C"),
        txn(10, TxnType::Transfer, 9_999.0, "C"),
    ];
    let high_risk = high_risk_customers(&txns, &FraudRules::default());

    let ids: Vec<&str> = high_risk.iter().map(|c| c.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C"], "B has only two frauds");

    assert_eq!(high_risk[0].fraud_count, 3);
    assert_eq!(high_risk[0].total_fraud_amount, 600.0);
    assert_eq!(high_risk[0].max_fraud_amount, 300.0);
    assert_eq!(high_risk[1].fraud_count, 4);
    assert_eq!(
        high_risk[1].total_fraud_amount, 200.0,
        "non-fraud rows do not count"
    );
}

#[test]
fn high_risk_empty_without_fraud() {
    let txns = vec![txn(1, TxnType::Payment, 10.0, "A")];
    assert!(high_risk_customers(&txns, &FraudRules::default()).is_empty());
}

// ── Flag effectiveness ───────────────────────────────────────────────────────

#[test]
fn flag_effectiveness_counts() {
    let txns = vec![
        txn(1, TxnType::Transfer, 500_000.0, "A").fraudulent(true),
        fraud(2, 100.0, "B"),
        fraud(3, 100.0, "C"),
        fraud(4, 100.0, "D"),
        txn(5, TxnType::Payment, 1.0, "E"),
    ];
    let eff = flag_effectiveness(&txns);

    assert_eq!(eff.total_count, 5);
    assert_eq!(eff.flagged_count, 1);
    assert_eq!(eff.fraud_count, 4);
    assert_eq!(eff.true_positives, 1);
    assert_eq!(eff.precision, Some(1.0));
    assert_eq!(eff.recall, Some(0.25));

    let none = flag_effectiveness(&[txn(1, TxnType::Payment, 1.0, "A")]);
    assert_eq!(none.precision, None);
    assert_eq!(none.recall, None);
}

// ── Fraud patterns ───────────────────────────────────────────────────────────

#[test]
fn patterns_and_hourly_buckets() {
    let late = Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 0).unwrap();
    let txns = vec![
        fraud(1, 700.0, "A").with_balances(700.0, 0.0),
        txn(2, TxnType::Payment, 20.0, "B"),
        Transaction::new(3, TxnType::CashOut, 300.0, "C", late).fraudulent(false),
    ];

    let patterns = fraud_patterns(&txns);
    assert_eq!(patterns.len(), 2, "only fraudulent rows");
    assert_eq!(patterns[0].txn_type, TxnType::Transfer);
    assert_eq!(patterns[0].hour, 14);
    assert_eq!(patterns[0].old_balance_orig, 700.0);
    assert_eq!(patterns[1].hour, 23);

    let hourly = fraud_by_hour(&txns);
    assert_eq!(hourly.len(), 24);
    assert_eq!(hourly[14].fraud_count, 1);
    assert_eq!(hourly[14].fraud_amount, 700.0);
    assert_eq!(hourly[23].fraud_count, 1);
    let total: usize = hourly.iter().map(|h| h.fraud_count).sum();
    assert_eq!(total, 2);
}
