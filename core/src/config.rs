use crate::{
    error::{AnalyticsError, AnalyticsResult},
    transaction::TxnType,
};
use serde::{Deserialize, Serialize};

// ── Segmentation ───────────────────────────────────────────────────

/// Tier cut-offs. A customer lands in a tier when its total is strictly
/// greater than the cut-off; tiers are evaluated from Platinum down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentThresholds {
    pub platinum: f64,
    pub gold: f64,
    pub silver: f64,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self {
            platinum: 1_000_000.0,
            gold: 500_000.0,
            silver: 100_000.0,
        }
    }
}

// ── Fraud rules ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRules {
    /// Absolute balance discrepancy above which a transaction is flagged.
    pub discrepancy_tolerance: f64,
    /// Transaction types checked by the balance discrepancy detector.
    pub discrepancy_types: Vec<TxnType>,
    /// Minimum fraudulent transaction count for a high-risk customer.
    pub high_risk_min_fraud_count: usize,
    /// Size of the top-N fraudulent transaction list in the daily report.
    pub top_fraud_limit: usize,
}

impl Default for FraudRules {
    fn default() -> Self {
        Self {
            discrepancy_tolerance: 1.0,
            discrepancy_types: vec![TxnType::CashOut, TxnType::Transfer],
            high_risk_min_fraud_count: 3,
            top_fraud_limit: 10,
        }
    }
}

// ── Export ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub customer_segments_file: String,
    pub fraud_patterns_file: String,
    /// Single-byte field delimiter, e.g. "," or ";".
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            customer_segments_file: "customer_segments.csv".into(),
            fraud_patterns_file: "fraud_patterns.csv".into(),
            delimiter: default_delimiter(),
        }
    }
}

impl ExportConfig {
    pub fn delimiter_byte(&self) -> AnalyticsResult<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(AnalyticsError::InvalidConfig(format!(
                "delimiter '{}' is not a single-byte character",
                self.delimiter
            )))
        }
    }
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub segments: SegmentThresholds,
    #[serde(default)]
    pub fraud: FraudRules,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AnalyticsConfig {
    /// Load from the data/ directory.
    /// In tests, use AnalyticsConfig::default_test().
    pub fn load(data_dir: &str) -> AnalyticsResult<Self> {
        let path = format!("{data_dir}/analytics/analytics_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalyticsConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded analytics config from {path}");
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        let s = &self.segments;
        if !(s.platinum > s.gold && s.gold > s.silver && s.silver >= 0.0) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "segment thresholds must descend: platinum {} > gold {} > silver {} >= 0",
                s.platinum, s.gold, s.silver
            )));
        }
        if self.fraud.discrepancy_tolerance < 0.0 {
            return Err(AnalyticsError::InvalidConfig(
                "discrepancy_tolerance must be >= 0".into(),
            ));
        }
        if self.fraud.top_fraud_limit == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "top_fraud_limit must be > 0".into(),
            ));
        }
        self.export.delimiter_byte()?;
        Ok(())
    }
}
