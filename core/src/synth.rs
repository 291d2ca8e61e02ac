//! Synthetic PaySim-style transaction generator.
//!
//! Output always satisfies the ingestion invariants. Fraud only occurs on
//! TRANSFER and CASH_OUT, fraudulent transfers usually drain the origin
//! account, and large fraudulent transfers are flagged.

use crate::{
    error::AnalyticsResult,
    rng::{SeededRng, Stream},
    transaction::{Transaction, TxnType},
    types::round_to,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::io::Write;

/// Mix of types in the generated set, in `TxnType::ALL` order.
const TYPE_WEIGHTS: [f64; 5] = [0.34, 0.08, 0.35, 0.01, 0.22];
const FLAGGED_TRANSFER_MIN: f64 = 200_000.0;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub transactions: usize,
    pub customers: usize,
    /// Probability that any generated row is fraudulent.
    pub fraud_share: f64,
    pub start: DateTime<Utc>,
    /// Number of hourly steps the set is spread over.
    pub steps: i64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            transactions: 1_000,
            customers: 200,
            fraud_share: 0.02,
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            steps: 72,
        }
    }
}

pub struct SyntheticGenerator {
    config: SyntheticConfig,
    customers: SeededRng,
    types: SeededRng,
    amounts: SeededRng,
    balances: SeededRng,
    fraud: SeededRng,
}

impl SyntheticGenerator {
    pub fn new(config: SyntheticConfig) -> Self {
        let seed = config.seed;
        Self {
            config,
            customers: SeededRng::for_stream(seed, Stream::Customers),
            types: SeededRng::for_stream(seed, Stream::Types),
            amounts: SeededRng::for_stream(seed, Stream::Amounts),
            balances: SeededRng::for_stream(seed, Stream::Balances),
            fraud: SeededRng::for_stream(seed, Stream::Fraud),
        }
    }

    pub fn generate(&mut self) -> Vec<Transaction> {
        let n = self.config.transactions;
        let steps = self.config.steps.max(1);
        (0..n)
            .map(|i| {
                let step = 1 + (i as i64 * steps) / n.max(1) as i64;
                self.next_transaction(i as i64 + 1, step)
            })
            .collect()
    }

    fn next_transaction(&mut self, txn_id: i64, step: i64) -> Transaction {
        let customers = self.config.customers.max(1) as u64;
        let origin = format!("C{:09}", self.customers.next_u64_below(customers));
        let is_fraud = self.fraud.chance(self.config.fraud_share);

        let mut txn_type = TxnType::ALL[self.types.weighted_index(&TYPE_WEIGHTS)];
        if is_fraud && !matches!(txn_type, TxnType::Transfer | TxnType::CashOut) {
            txn_type = if self.fraud.chance(0.5) {
                TxnType::Transfer
            } else {
                TxnType::CashOut
            };
        }

        let x_min = if is_fraud { 5_000.0 } else { 10.0 };
        let amount = round_to(self.amounts.pareto(x_min, 1.4).min(10_000_000.0), 2);

        let old_balance_orig = if is_fraud {
            // Drained accounts: the balance covers the amount exactly or falls short.
            round_to(amount * (0.5 + self.balances.next_f64() * 0.5), 2)
        } else {
            round_to(amount + self.balances.pareto(50.0, 1.2).min(5_000_000.0), 2)
        };
        let new_balance_orig = match txn_type {
            TxnType::CashIn => round_to(old_balance_orig + amount, 2),
            _ => round_to((old_balance_orig - amount).max(0.0), 2),
        };

        let dest = if txn_type == TxnType::Payment {
            format!("M{:09}", self.customers.next_u64_below(customers * 10))
        } else {
            format!("C{:09}", self.customers.next_u64_below(customers))
        };
        let old_balance_dest = if txn_type == TxnType::Payment {
            0.0
        } else {
            round_to(self.balances.pareto(100.0, 1.3).min(5_000_000.0), 2)
        };
        let new_balance_dest = match txn_type {
            TxnType::Payment => 0.0,
            TxnType::CashIn => round_to((old_balance_dest - amount).max(0.0), 2),
            _ => round_to(old_balance_dest + amount, 2),
        };

        let minute = self.customers.next_u64_below(60) as i64;
        let timestamp = self.config.start + Duration::hours(step - 1) + Duration::minutes(minute);

        Transaction {
            txn_id,
            step,
            txn_type,
            amount,
            origin_id: origin,
            old_balance_orig,
            new_balance_orig,
            dest_id: dest,
            old_balance_dest,
            new_balance_dest,
            is_fraud,
            is_flagged_fraud: is_fraud
                && txn_type == TxnType::Transfer
                && amount > FLAGGED_TRANSFER_MIN,
            timestamp,
        }
    }
}

#[derive(Serialize)]
struct PaySimRow<'a> {
    step: i64,
    #[serde(rename = "type")]
    txn_type: &'static str,
    amount: f64,
    #[serde(rename = "nameOrig")]
    origin_id: &'a str,
    #[serde(rename = "oldbalanceOrg")]
    old_balance_orig: f64,
    #[serde(rename = "newbalanceOrig")]
    new_balance_orig: f64,
    #[serde(rename = "nameDest")]
    dest_id: &'a str,
    #[serde(rename = "oldbalanceDest")]
    old_balance_dest: f64,
    #[serde(rename = "newbalanceDest")]
    new_balance_dest: f64,
    #[serde(rename = "isFraud")]
    is_fraud: u8,
    #[serde(rename = "isFlaggedFraud")]
    is_flagged_fraud: u8,
    timestamp: String,
}

/// Write `txns` in the ingestion CSV layout, timestamp column included.
pub fn write_paysim_csv<W: Write>(sink: W, txns: &[Transaction]) -> AnalyticsResult<usize> {
    let mut writer = csv::Writer::from_writer(sink);
    for t in txns {
        writer.serialize(PaySimRow {
            step: t.step,
            txn_type: t.txn_type.as_str(),
            amount: t.amount,
            origin_id: &t.origin_id,
            old_balance_orig: t.old_balance_orig,
            new_balance_orig: t.new_balance_orig,
            dest_id: &t.dest_id,
            old_balance_dest: t.old_balance_dest,
            new_balance_dest: t.new_balance_dest,
            is_fraud: t.is_fraud as u8,
            is_flagged_fraud: t.is_flagged_fraud as u8,
            timestamp: t.timestamp.to_rfc3339(),
        })?;
    }
    writer.flush()?;
    Ok(txns.len())
}
