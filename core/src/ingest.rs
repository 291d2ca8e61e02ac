//! CSV ingestion and the data-quality gate.
//!
//! RULE: nothing reaches the store without passing `validate_row`.
//! A file with any bad row is rejected as a whole, and every bad row is
//! reported with its row number so the source data can be fixed.

use crate::{
    error::{AnalyticsError, AnalyticsResult, ValidationError, ValidationReason},
    transaction::{Transaction, TxnType},
    types::TxnId,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::{io::Read, path::Path};

/// One row as it appears on the wire. Column names follow the PaySim
/// export; camelCase names are accepted as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvTransactionRow {
    pub step: i64,
    #[serde(rename = "type")]
    pub txn_type: String,
    pub amount: f64,
    #[serde(rename = "nameOrig", alias = "originId")]
    pub origin_id: String,
    #[serde(rename = "oldbalanceOrg", alias = "oldBalanceOrig")]
    pub old_balance_orig: f64,
    #[serde(rename = "newbalanceOrig", alias = "newBalanceOrig")]
    pub new_balance_orig: f64,
    #[serde(rename = "nameDest", alias = "destId")]
    pub dest_id: String,
    #[serde(rename = "oldbalanceDest", alias = "oldBalanceDest")]
    pub old_balance_dest: f64,
    #[serde(rename = "newbalanceDest", alias = "newBalanceDest")]
    pub new_balance_dest: f64,
    #[serde(rename = "isFraud")]
    pub is_fraud: i64,
    #[serde(rename = "isFlaggedFraud")]
    pub is_flagged_fraud: i64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Check one row against the data invariants and build the record.
/// `ingested_at` stands in for a missing timestamp.
pub fn validate_row(
    row: CsvTransactionRow,
    txn_id: TxnId,
    ingested_at: DateTime<Utc>,
) -> Result<Transaction, ValidationReason> {
    let txn_type: TxnType = row
        .txn_type
        .parse()
        .map_err(|_| ValidationReason::UnknownType(row.txn_type.clone()))?;

    check_amounts(
        row.amount,
        [
            row.old_balance_orig,
            row.new_balance_orig,
            row.old_balance_dest,
            row.new_balance_dest,
        ],
    )?;
    let is_fraud = parse_flag("isFraud", row.is_fraud)?;
    let is_flagged_fraud = parse_flag("isFlaggedFraud", row.is_flagged_fraud)?;

    Ok(Transaction {
        txn_id,
        step: row.step,
        txn_type,
        amount: row.amount,
        origin_id: row.origin_id,
        old_balance_orig: row.old_balance_orig,
        new_balance_orig: row.new_balance_orig,
        dest_id: row.dest_id,
        old_balance_dest: row.old_balance_dest,
        new_balance_dest: row.new_balance_dest,
        is_fraud,
        is_flagged_fraud,
        timestamp: row.timestamp.unwrap_or(ingested_at),
    })
}

/// The numeric invariants for a record that is already typed: a finite
/// positive amount and finite non-negative balances.
pub fn check_transaction(txn: &Transaction) -> Result<(), ValidationReason> {
    check_amounts(
        txn.amount,
        [
            txn.old_balance_orig,
            txn.new_balance_orig,
            txn.old_balance_dest,
            txn.new_balance_dest,
        ],
    )
}

/// Check every record and collect one `ValidationError` per offender.
/// Row numbers are 1-based positions in `txns`.
pub fn check_transactions(txns: &[Transaction]) -> AnalyticsResult<()> {
    let rejected: Vec<ValidationError> = txns
        .iter()
        .enumerate()
        .filter_map(|(idx, txn)| {
            check_transaction(txn).err().map(|reason| ValidationError {
                row: idx + 1,
                origin_id: Some(txn.origin_id.clone()),
                reason,
            })
        })
        .collect();
    reject_if_any(rejected)
}

const BALANCE_FIELDS: [&str; 4] = [
    "oldBalanceOrig",
    "newBalanceOrig",
    "oldBalanceDest",
    "newBalanceDest",
];

fn check_amounts(amount: f64, balances: [f64; 4]) -> Result<(), ValidationReason> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationReason::NonPositiveAmount(amount));
    }
    for (field, value) in BALANCE_FIELDS.into_iter().zip(balances) {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationReason::NegativeBalance { field, value });
        }
    }
    Ok(())
}

fn reject_if_any(rejected: Vec<ValidationError>) -> AnalyticsResult<()> {
    if rejected.is_empty() {
        return Ok(());
    }
    for err in rejected.iter().take(10) {
        log::warn!("Rejected {err}");
    }
    Err(AnalyticsError::Validation(rejected))
}

fn parse_flag(field: &'static str, value: i64) -> Result<bool, ValidationReason> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ValidationReason::InvalidFlag { field, value: other }),
    }
}

/// Read and validate every row from a CSV source.
///
/// Returns `AnalyticsError::Validation` listing all offending rows if any
/// row fails; I/O failures abort immediately.
pub fn read_transactions<R: Read>(
    source: R,
    ingested_at: DateTime<Utc>,
) -> AnalyticsResult<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for (idx, result) in reader.deserialize::<CsvTransactionRow>().enumerate() {
        let row_number = idx + 1;
        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                rejected.push(ValidationError {
                    row: row_number,
                    origin_id: None,
                    reason: ValidationReason::Malformed(e.to_string()),
                });
                continue;
            }
        };
        let origin_id = row.origin_id.clone();
        match validate_row(row, row_number as TxnId, ingested_at) {
            Ok(txn) => accepted.push(txn),
            Err(reason) => rejected.push(ValidationError {
                row: row_number,
                origin_id: Some(origin_id),
                reason,
            }),
        }
    }

    reject_if_any(rejected)?;
    log::info!("Validated {} transaction rows", accepted.len());
    Ok(accepted)
}

/// Open `path` and read it with [`read_transactions`], stamping rows that
/// carry no timestamp with the current time.
pub fn read_transactions_from_path(path: impl AsRef<Path>) -> AnalyticsResult<Vec<Transaction>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    log::debug!("Reading transactions from {}", path.display());
    read_transactions(file, Utc::now())
}
