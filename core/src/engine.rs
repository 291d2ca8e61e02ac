//! The report engine: one explicit handle to the transaction dataset.
//!
//! RULES:
//!   - The engine owns the store; components never see a connection.
//!   - Every analysis reads the immutable transaction set from the store
//!     and hands a slice to a pure component function.
//!   - Ingestion is all-or-nothing: a file with any invalid row stores nothing.

use crate::{
    aggregator::{self, CustomerAggregate, TypeSummary},
    config::AnalyticsConfig,
    error::AnalyticsResult,
    export,
    fraud_scorer::{
        self, BalanceDiscrepancy, FlagEffectiveness, FraudPattern, FraudRate, HighRiskCustomer,
        HourlyFraud,
    },
    ingest,
    report::{self, AnalysisSummary, DailyFraudReport},
    segmentation::{self, CustomerSegment, SegmentPopulation},
    store::TxnStore,
    transaction::Transaction,
    types::RunId,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::{
    io::Read,
    path::{Path, PathBuf},
};

pub struct ReportEngine {
    pub run_id: RunId,
    pub config: AnalyticsConfig,
    pub store: TxnStore,
}

/// Where `export_all` wrote its files and how many rows each holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub customer_segments_path: PathBuf,
    pub customer_segments_rows: usize,
    pub fraud_patterns_path: PathBuf,
    pub fraud_patterns_rows: usize,
}

impl ReportEngine {
    pub fn new(run_id: RunId, config: AnalyticsConfig, store: TxnStore) -> Self {
        Self {
            run_id,
            config,
            store,
        }
    }

    /// Build an engine over a migrated store with config loaded from `data_dir`.
    pub fn build(store: TxnStore, data_dir: &str) -> AnalyticsResult<Self> {
        let config = AnalyticsConfig::load(data_dir)?;
        store.migrate()?;
        Ok(Self::new(new_run_id(), config, store))
    }

    /// In-memory store and default config.
    pub fn build_test(run_id: RunId) -> AnalyticsResult<Self> {
        let store = TxnStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(run_id, AnalyticsConfig::default_test(), store))
    }

    // ── Ingestion ──────────────────────────────────────────────────

    /// Store an already-built set. Records go through the same numeric
    /// checks as CSV rows; any failure rejects the whole set.
    pub fn ingest(&self, txns: &[Transaction]) -> AnalyticsResult<usize> {
        ingest::check_transactions(txns)?;
        let stored = self.store.insert_transactions(txns)?;
        log::info!("run={} stored {stored} transactions", self.run_id);
        Ok(stored)
    }

    /// Like `ingest`, but the new set replaces whatever the store held.
    pub fn replace(&self, txns: &[Transaction]) -> AnalyticsResult<usize> {
        ingest::check_transactions(txns)?;
        let stored = self.store.replace_transactions(txns)?;
        log::info!("run={} replaced the stored set with {stored} transactions", self.run_id);
        Ok(stored)
    }

    pub fn ingest_reader<R: Read>(
        &self,
        source: R,
        ingested_at: DateTime<Utc>,
    ) -> AnalyticsResult<usize> {
        let txns = ingest::read_transactions(source, ingested_at)?;
        self.ingest(&txns)
    }

    pub fn ingest_path(&self, path: impl AsRef<Path>) -> AnalyticsResult<usize> {
        let txns = ingest::read_transactions_from_path(path)?;
        self.ingest(&txns)
    }

    pub fn transactions(&self) -> AnalyticsResult<Vec<Transaction>> {
        self.store.all_transactions()
    }

    // ── Aggregator ─────────────────────────────────────────────────

    pub fn type_distribution(&self) -> AnalyticsResult<Vec<TypeSummary>> {
        Ok(aggregator::type_distribution(&self.transactions()?))
    }

    pub fn customer_aggregates(&self) -> AnalyticsResult<Vec<CustomerAggregate>> {
        Ok(aggregator::customer_aggregates(&self.transactions()?))
    }

    // ── Segmentation ───────────────────────────────────────────────

    pub fn customer_segments(&self) -> AnalyticsResult<Vec<CustomerSegment>> {
        let aggregates = self.customer_aggregates()?;
        Ok(segmentation::segment_customers(
            &aggregates,
            &self.config.segments,
        ))
    }

    pub fn segment_population(&self) -> AnalyticsResult<Vec<SegmentPopulation>> {
        Ok(segmentation::segment_population(&self.customer_segments()?))
    }

    // ── Fraud scoring ──────────────────────────────────────────────

    pub fn fraud_rates(&self) -> AnalyticsResult<Vec<FraudRate>> {
        Ok(fraud_scorer::fraud_rates(&self.transactions()?))
    }

    pub fn balance_discrepancies(&self) -> AnalyticsResult<Vec<BalanceDiscrepancy>> {
        Ok(fraud_scorer::balance_discrepancies(
            &self.transactions()?,
            &self.config.fraud,
        ))
    }

    pub fn flagged_discrepancies(&self) -> AnalyticsResult<Vec<BalanceDiscrepancy>> {
        Ok(fraud_scorer::flagged_discrepancies(
            &self.transactions()?,
            &self.config.fraud,
        ))
    }

    /// The high-risk query: no parameters, sorted by total fraud amount.
    pub fn high_risk_customers(&self) -> AnalyticsResult<Vec<HighRiskCustomer>> {
        Ok(fraud_scorer::high_risk_customers(
            &self.transactions()?,
            &self.config.fraud,
        ))
    }

    pub fn flag_effectiveness(&self) -> AnalyticsResult<FlagEffectiveness> {
        Ok(fraud_scorer::flag_effectiveness(&self.transactions()?))
    }

    pub fn fraud_patterns(&self) -> AnalyticsResult<Vec<FraudPattern>> {
        Ok(fraud_scorer::fraud_patterns(
            &self.store.fraudulent_transactions()?,
        ))
    }

    pub fn fraud_by_hour(&self) -> AnalyticsResult<Vec<HourlyFraud>> {
        Ok(fraud_scorer::fraud_by_hour(
            &self.store.fraudulent_transactions()?,
        ))
    }

    // ── Reports ────────────────────────────────────────────────────

    /// The report invocation: fraud summary and top-N list for one date.
    pub fn daily_fraud_report(&self, date: NaiveDate) -> AnalyticsResult<DailyFraudReport> {
        let txns = self.store.transactions_on_date(date)?;
        let report = report::daily_fraud_report(date, &txns, self.config.fraud.top_fraud_limit);
        log::info!(
            "run={} daily report {date}: {} transactions, {} fraudulent",
            self.run_id,
            report.transaction_count,
            report.fraud_count()
        );
        Ok(report)
    }

    /// Compute the full summary in one pass over the set and record it on
    /// the run log.
    pub fn run_summary(&self) -> AnalyticsResult<AnalysisSummary> {
        let started_at = Utc::now();
        let txns = self.transactions()?;
        self.store
            .insert_run(&self.run_id, started_at, txns.len() as i64)?;

        let summary = self.summarize(&txns);
        match serde_json::to_string(&summary) {
            Ok(json) => {
                self.store.complete_run(&self.run_id, Utc::now(), &json)?;
                log::debug!("run={} summary recorded", self.run_id);
                Ok(summary)
            }
            Err(e) => {
                self.store.fail_run(&self.run_id, Utc::now())?;
                Err(e.into())
            }
        }
    }

    fn summarize(&self, txns: &[Transaction]) -> AnalysisSummary {
        let aggregates = aggregator::customer_aggregates(txns);
        let segments = segmentation::segment_customers(&aggregates, &self.config.segments);
        let discrepancies = fraud_scorer::balance_discrepancies(txns, &self.config.fraud);

        AnalysisSummary {
            run_id: self.run_id.clone(),
            transaction_count: txns.len(),
            fraud_count: txns.iter().filter(|t| t.is_fraud).count(),
            customer_count: aggregates.len(),
            type_distribution: aggregator::type_distribution(txns),
            segment_population: segmentation::segment_population(&segments),
            fraud_rates: fraud_scorer::fraud_rates(txns),
            high_risk_customer_count: fraud_scorer::high_risk_customers(txns, &self.config.fraud)
                .len(),
            discrepancies_checked: discrepancies.len(),
            discrepancies_flagged: discrepancies.iter().filter(|d| d.flagged).count(),
            flag_effectiveness: fraud_scorer::flag_effectiveness(txns),
        }
    }

    // ── Export ─────────────────────────────────────────────────────

    /// Write `customer_segments` and `fraud_patterns` into `out_dir`.
    /// Either both files are replaced or neither is.
    pub fn export_all(&self, out_dir: &Path) -> AnalyticsResult<ExportOutcome> {
        let delimiter = self.config.export.delimiter_byte()?;
        let segments = self.customer_segments()?;
        let patterns = self.fraud_patterns()?;

        let segments_bytes = export::render_records(&segments, delimiter)?;
        let patterns_bytes = export::render_records(&patterns, delimiter)?;

        std::fs::create_dir_all(out_dir)?;
        let customer_segments_path = out_dir.join(&self.config.export.customer_segments_file);
        let fraud_patterns_path = out_dir.join(&self.config.export.fraud_patterns_file);
        export::persist_all_atomically(&[
            (customer_segments_path.as_path(), segments_bytes.as_slice()),
            (fraud_patterns_path.as_path(), patterns_bytes.as_slice()),
        ])?;

        log::info!(
            "run={} exported {} segment rows and {} fraud pattern rows to {}",
            self.run_id,
            segments.len(),
            patterns.len(),
            out_dir.display()
        );
        Ok(ExportOutcome {
            customer_segments_path,
            customer_segments_rows: segments.len(),
            fraud_patterns_path,
            fraud_patterns_rows: patterns.len(),
        })
    }
}

pub fn new_run_id() -> RunId {
    format!("run-{}", uuid::Uuid::new_v4())
}
