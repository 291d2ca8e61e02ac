//! The transaction record and its type enumeration.
//!
//! Transactions are created once at ingestion and never mutated.

use crate::types::{CustomerId, Step, TxnId};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnType {
    Payment,
    Transfer,
    CashOut,
    Debit,
    CashIn,
}

impl TxnType {
    pub const ALL: [TxnType; 5] = [
        TxnType::Payment,
        TxnType::Transfer,
        TxnType::CashOut,
        TxnType::Debit,
        TxnType::CashIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Payment => "PAYMENT",
            TxnType::Transfer => "TRANSFER",
            TxnType::CashOut => "CASH_OUT",
            TxnType::Debit => "DEBIT",
            TxnType::CashIn => "CASH_IN",
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction type '{0}'")]
pub struct ParseTxnTypeError(pub String);

impl FromStr for TxnType {
    type Err = ParseTxnTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PAYMENT" => Ok(TxnType::Payment),
            "TRANSFER" => Ok(TxnType::Transfer),
            "CASH_OUT" => Ok(TxnType::CashOut),
            "DEBIT" => Ok(TxnType::Debit),
            "CASH_IN" => Ok(TxnType::CashIn),
            other => Err(ParseTxnTypeError(other.to_string())),
        }
    }
}

/// One validated banking transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub txn_id: TxnId,
    pub step: Step,
    pub txn_type: TxnType,
    pub amount: f64,
    pub origin_id: CustomerId,
    pub old_balance_orig: f64,
    pub new_balance_orig: f64,
    pub dest_id: CustomerId,
    pub old_balance_dest: f64,
    pub new_balance_dest: f64,
    pub is_fraud: bool,
    pub is_flagged_fraud: bool,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Minimal constructor used by tests and the synthetic generator.
    /// Balances default to a consistent debit of `amount` from the origin.
    pub fn new(
        txn_id: TxnId,
        txn_type: TxnType,
        amount: f64,
        origin_id: impl Into<CustomerId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            txn_id,
            step: 1,
            txn_type,
            amount,
            origin_id: origin_id.into(),
            old_balance_orig: amount,
            new_balance_orig: 0.0,
            dest_id: String::new(),
            old_balance_dest: 0.0,
            new_balance_dest: 0.0,
            is_fraud: false,
            is_flagged_fraud: false,
            timestamp,
        }
    }

    pub fn with_balances(mut self, old_balance_orig: f64, new_balance_orig: f64) -> Self {
        self.old_balance_orig = old_balance_orig;
        self.new_balance_orig = new_balance_orig;
        self
    }

    pub fn with_dest(mut self, dest_id: impl Into<CustomerId>, old: f64, new: f64) -> Self {
        self.dest_id = dest_id.into();
        self.old_balance_dest = old;
        self.new_balance_dest = new;
        self
    }

    pub fn fraudulent(mut self, flagged: bool) -> Self {
        self.is_fraud = true;
        self.is_flagged_fraud = flagged;
        self
    }

    pub fn at_step(mut self, step: Step) -> Self {
        self.step = step;
        self
    }

    /// UTC hour of day (0-23) of the transaction timestamp.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}
