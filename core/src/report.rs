//! Structured report results.
//!
//! Reports are plain values. Printing and file output live in export.rs and
//! the runner binary.

use crate::{
    aggregator::TypeSummary,
    error::{AnalyticsError, AnalyticsResult},
    fraud_scorer::{FlagEffectiveness, FraudRate},
    segmentation::SegmentPopulation,
    transaction::{Transaction, TxnType},
    types::RunId,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

// ── Daily fraud report ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeFraudSummary {
    pub txn_type: TxnType,
    pub fraud_count: usize,
    pub average_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyFraudReport {
    pub date: NaiveDate,
    /// All transactions on the date, fraudulent or not.
    pub transaction_count: usize,
    /// Fraud count and mean amount per type; types without fraud are omitted.
    pub summary: Vec<TypeFraudSummary>,
    /// Largest fraudulent transactions of the day, amount descending.
    pub top_transactions: Vec<Transaction>,
}

impl DailyFraudReport {
    pub fn fraud_count(&self) -> usize {
        self.summary.iter().map(|s| s.fraud_count).sum()
    }
}

/// Build the report for `date` from `txns`. Rows from other dates are
/// ignored, so the full set or a pre-filtered day both work.
pub fn daily_fraud_report(date: NaiveDate, txns: &[Transaction], limit: usize) -> DailyFraudReport {
    let on_date: Vec<&Transaction> = txns
        .iter()
        .filter(|t| t.timestamp.date_naive() == date)
        .collect();

    let mut groups: BTreeMap<TxnType, (usize, f64)> = BTreeMap::new();
    for txn in on_date.iter().filter(|t| t.is_fraud) {
        let group = groups.entry(txn.txn_type).or_insert((0, 0.0));
        group.0 += 1;
        group.1 += txn.amount;
    }
    let summary = groups
        .into_iter()
        .map(|(txn_type, (count, amount))| TypeFraudSummary {
            txn_type,
            fraud_count: count,
            average_amount: amount / count as f64,
        })
        .collect();

    let mut fraudulent: Vec<&Transaction> =
        on_date.iter().copied().filter(|t| t.is_fraud).collect();
    fraudulent.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then(a.txn_id.cmp(&b.txn_id))
    });
    let top_transactions = fraudulent.into_iter().take(limit).cloned().collect();

    DailyFraudReport {
        date,
        transaction_count: on_date.len(),
        summary,
        top_transactions,
    }
}

pub fn parse_report_date(raw: &str) -> AnalyticsResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AnalyticsError::InvalidDate(raw.to_string()))
}

// ── Run summary ─────────────────────────────────────────────────────

/// Everything one report run computes, persisted as JSON on the run record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub run_id: RunId,
    pub transaction_count: usize,
    pub fraud_count: usize,
    pub customer_count: usize,
    pub type_distribution: Vec<TypeSummary>,
    pub segment_population: Vec<SegmentPopulation>,
    pub fraud_rates: Vec<FraudRate>,
    pub high_risk_customer_count: usize,
    pub discrepancies_checked: usize,
    pub discrepancies_flagged: usize,
    pub flag_effectiveness: FlagEffectiveness,
}
