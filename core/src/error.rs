use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{} row(s) failed validation", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("Invalid report date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// A single source row that violated a data invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    /// Originating customer id, when the row was readable enough to have one.
    pub origin_id: Option<String>,
    pub reason: ValidationReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationReason {
    NonPositiveAmount(f64),
    NegativeBalance { field: &'static str, value: f64 },
    UnknownType(String),
    InvalidFlag { field: &'static str, value: i64 },
    Malformed(String),
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(v) => write!(f, "amount must be finite and > 0, got {v}"),
            Self::NegativeBalance { field, value } => {
                write!(f, "{field} must be finite and >= 0, got {value}")
            }
            Self::UnknownType(t) => write!(f, "unknown transaction type '{t}'"),
            Self::InvalidFlag { field, value } => {
                write!(f, "{field} must be 0 or 1, got {value}")
            }
            Self::Malformed(msg) => write!(f, "malformed row: {msg}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin_id {
            Some(id) => write!(f, "row {} ({id}): {}", self.row, self.reason),
            None => write!(f, "row {}: {}", self.row, self.reason),
        }
    }
}

impl std::error::Error for ValidationError {}
