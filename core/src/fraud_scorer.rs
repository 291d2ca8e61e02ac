//! Rule-based fraud indicators over the transaction set.
//!
//! Reads transactions directly; nothing here depends on the aggregator.
//!   1. Fraud rate per transaction type
//!   2. Balance discrepancy on debits from the origin account
//!   3. High-risk customers (repeat fraud)
//!   4. How well `is_flagged_fraud` tracks `is_fraud`
//!   5. Fraud patterns by hour of day

use crate::{
    config::FraudRules,
    transaction::{Transaction, TxnType},
    types::{round_to, CustomerId, TxnId},
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

// ── Fraud rate ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraudRate {
    pub txn_type: TxnType,
    pub total_count: usize,
    pub fraud_count: usize,
    /// Percentage of the group flagged `is_fraud`, rounded to 3 places.
    pub fraud_rate: f64,
    /// Mean amount over fraudulent rows only; `None` when there are none.
    pub avg_fraud_amount: Option<f64>,
}

/// Ordered by fraud rate descending, then type.
pub fn fraud_rates(txns: &[Transaction]) -> Vec<FraudRate> {
    // (total, fraud count, fraud amount)
    let mut groups: BTreeMap<TxnType, (usize, usize, f64)> = BTreeMap::new();
    for txn in txns {
        let group = groups.entry(txn.txn_type).or_insert((0, 0, 0.0));
        group.0 += 1;
        if txn.is_fraud {
            group.1 += 1;
            group.2 += txn.amount;
        }
    }

    let mut rates: Vec<FraudRate> = groups
        .into_iter()
        .map(|(txn_type, (total, fraud, fraud_amount))| FraudRate {
            txn_type,
            total_count: total,
            fraud_count: fraud,
            fraud_rate: if total > 0 {
                round_to(fraud as f64 / total as f64 * 100.0, 3)
            } else {
                0.0
            },
            avg_fraud_amount: (fraud > 0).then(|| fraud_amount / fraud as f64),
        })
        .collect();
    rates.sort_by(|a, b| {
        b.fraud_rate
            .total_cmp(&a.fraud_rate)
            .then(a.txn_type.cmp(&b.txn_type))
    });
    rates
}

// ── Balance discrepancy ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceDiscrepancy {
    pub txn_id: TxnId,
    pub origin_id: CustomerId,
    pub txn_type: TxnType,
    pub amount: f64,
    pub old_balance_orig: f64,
    pub new_balance_orig: f64,
    /// `old_balance_orig - amount`
    pub expected_balance: f64,
    /// `new_balance_orig - expected_balance`
    pub discrepancy: f64,
    pub flagged: bool,
}

/// `None` when the transaction's type is not checked by `rules`.
pub fn check_balance(txn: &Transaction, rules: &FraudRules) -> Option<BalanceDiscrepancy> {
    if !rules.discrepancy_types.contains(&txn.txn_type) {
        return None;
    }
    let expected_balance = txn.old_balance_orig - txn.amount;
    let discrepancy = txn.new_balance_orig - expected_balance;
    Some(BalanceDiscrepancy {
        txn_id: txn.txn_id,
        origin_id: txn.origin_id.clone(),
        txn_type: txn.txn_type,
        amount: txn.amount,
        old_balance_orig: txn.old_balance_orig,
        new_balance_orig: txn.new_balance_orig,
        expected_balance,
        discrepancy,
        flagged: discrepancy.abs() > rules.discrepancy_tolerance,
    })
}

/// Every checked transaction with its flag, in input order.
pub fn balance_discrepancies(txns: &[Transaction], rules: &FraudRules) -> Vec<BalanceDiscrepancy> {
    txns.iter().filter_map(|t| check_balance(t, rules)).collect()
}

pub fn flagged_discrepancies(txns: &[Transaction], rules: &FraudRules) -> Vec<BalanceDiscrepancy> {
    txns.iter()
        .filter_map(|t| check_balance(t, rules))
        .filter(|d| d.flagged)
        .collect()
}

// ── High-risk customers ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskCustomer {
    pub customer_id: CustomerId,
    pub fraud_count: usize,
    pub total_fraud_amount: f64,
    pub max_fraud_amount: f64,
}

/// Customers (by originating account) with at least
/// `rules.high_risk_min_fraud_count` fraudulent transactions, sorted by
/// total fraud amount descending.
pub fn high_risk_customers(txns: &[Transaction], rules: &FraudRules) -> Vec<HighRiskCustomer> {
    let mut by_customer: HashMap<&str, HighRiskCustomer> = HashMap::new();
    for txn in txns.iter().filter(|t| t.is_fraud) {
        let entry = by_customer
            .entry(txn.origin_id.as_str())
            .or_insert_with(|| HighRiskCustomer {
                customer_id: txn.origin_id.clone(),
                fraud_count: 0,
                total_fraud_amount: 0.0,
                max_fraud_amount: 0.0,
            });
        entry.fraud_count += 1;
        entry.total_fraud_amount += txn.amount;
        entry.max_fraud_amount = entry.max_fraud_amount.max(txn.amount);
    }

    let mut high_risk: Vec<HighRiskCustomer> = by_customer
        .into_values()
        .filter(|c| c.fraud_count >= rules.high_risk_min_fraud_count)
        .collect();
    high_risk.sort_by(|a, b| {
        b.total_fraud_amount
            .total_cmp(&a.total_fraud_amount)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    high_risk
}

// ── Flag effectiveness ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagEffectiveness {
    pub total_count: usize,
    pub flagged_count: usize,
    pub fraud_count: usize,
    /// Flagged and actually fraudulent.
    pub true_positives: usize,
    /// `true_positives / flagged_count`, 4 places; `None` when nothing was flagged.
    pub precision: Option<f64>,
    /// `true_positives / fraud_count`, 4 places; `None` when there is no fraud.
    pub recall: Option<f64>,
}

pub fn flag_effectiveness(txns: &[Transaction]) -> FlagEffectiveness {
    let flagged_count = txns.iter().filter(|t| t.is_flagged_fraud).count();
    let fraud_count = txns.iter().filter(|t| t.is_fraud).count();
    let true_positives = txns
        .iter()
        .filter(|t| t.is_flagged_fraud && t.is_fraud)
        .count();
    let ratio = |num: usize, den: usize| (den > 0).then(|| round_to(num as f64 / den as f64, 4));

    FlagEffectiveness {
        total_count: txns.len(),
        flagged_count,
        fraud_count,
        true_positives,
        precision: ratio(true_positives, flagged_count),
        recall: ratio(true_positives, fraud_count),
    }
}

// ── Fraud patterns ──────────────────────────────────────────────────

/// One fraudulent transaction as written to `fraud_patterns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudPattern {
    #[serde(rename = "type")]
    pub txn_type: TxnType,
    pub hour: u32,
    pub amount: f64,
    pub old_balance_orig: f64,
    pub new_balance_orig: f64,
}

/// Fraudulent rows only, in input order.
pub fn fraud_patterns(txns: &[Transaction]) -> Vec<FraudPattern> {
    txns.iter()
        .filter(|t| t.is_fraud)
        .map(|t| FraudPattern {
            txn_type: t.txn_type,
            hour: t.hour(),
            amount: t.amount,
            old_balance_orig: t.old_balance_orig,
            new_balance_orig: t.new_balance_orig,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyFraud {
    pub hour: u32,
    pub fraud_count: usize,
    pub fraud_amount: f64,
}

/// 24 buckets, hour 0 first; hours without fraud have zero counts.
pub fn fraud_by_hour(txns: &[Transaction]) -> Vec<HourlyFraud> {
    let mut buckets: Vec<HourlyFraud> = (0..24)
        .map(|hour| HourlyFraud {
            hour,
            fraud_count: 0,
            fraud_amount: 0.0,
        })
        .collect();
    for txn in txns.iter().filter(|t| t.is_fraud) {
        let bucket = &mut buckets[txn.hour() as usize];
        bucket.fraud_count += 1;
        bucket.fraud_amount += txn.amount;
    }
    buckets
}
