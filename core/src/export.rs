//! Delimited-record export.
//!
//! Pure formatting boundary: a header row, then one row per record.
//! File exports are all-or-nothing. Bodies are rendered in memory, written
//! to hidden sibling files and renamed over their destinations only once
//! every file of the export is on disk.

use crate::{
    aggregator::{CustomerAggregate, TypeSummary},
    error::AnalyticsResult,
    fraud_scorer::{BalanceDiscrepancy, FraudPattern, FraudRate, HighRiskCustomer},
    segmentation::CustomerSegment,
};
use serde::Serialize;
use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

/// A result row with a fixed column list. The header must list the
/// serialized field names in declaration order.
pub trait CsvRecord: Serialize {
    fn header() -> &'static [&'static str];
}

impl CsvRecord for CustomerSegment {
    fn header() -> &'static [&'static str] {
        &["customerId", "segment", "totalAmount"]
    }
}

impl CsvRecord for FraudPattern {
    fn header() -> &'static [&'static str] {
        &["type", "hour", "amount", "oldBalanceOrig", "newBalanceOrig"]
    }
}

impl CsvRecord for TypeSummary {
    fn header() -> &'static [&'static str] {
        &["txn_type", "count", "percentage_of_total", "average_amount", "total_volume"]
    }
}

impl CsvRecord for CustomerAggregate {
    fn header() -> &'static [&'static str] {
        &[
            "customer_id",
            "transaction_count",
            "total_amount",
            "max_transaction",
            "fraud_incident_count",
            "fraud_total_amount",
        ]
    }
}

impl CsvRecord for FraudRate {
    fn header() -> &'static [&'static str] {
        &["txn_type", "total_count", "fraud_count", "fraud_rate", "avg_fraud_amount"]
    }
}

impl CsvRecord for HighRiskCustomer {
    fn header() -> &'static [&'static str] {
        &["customer_id", "fraud_count", "total_fraud_amount", "max_fraud_amount"]
    }
}

impl CsvRecord for BalanceDiscrepancy {
    fn header() -> &'static [&'static str] {
        &[
            "txn_id",
            "origin_id",
            "txn_type",
            "amount",
            "old_balance_orig",
            "new_balance_orig",
            "expected_balance",
            "discrepancy",
            "flagged",
        ]
    }
}

/// Write `records` to any sink: a file, a stream or an in-memory buffer.
/// The header is written even when `records` is empty.
pub fn write_records<W: Write, R: CsvRecord>(
    sink: W,
    records: &[R],
    delimiter: u8,
) -> AnalyticsResult<usize> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(sink);
    writer.write_record(R::header())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Render `records` in memory; nothing touches the filesystem.
pub fn render_records<R: CsvRecord>(records: &[R], delimiter: u8) -> AnalyticsResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_records(&mut buf, records, delimiter)?;
    Ok(buf)
}

/// Write already-rendered bytes to `path`, replacing it atomically.
/// On failure the destination is untouched and the temp file is removed.
pub fn persist_atomically(path: &Path, bytes: &[u8]) -> AnalyticsResult<()> {
    persist_all_atomically(&[(path, bytes)])
}

/// Replace several files as one unit.
///
/// Every body is first written to a hidden `.partial` sibling. Only when all
/// of them are on disk are they renamed into place; an existing destination
/// is moved aside to a `.previous` sibling first. If any step fails, every
/// destination already replaced is restored, all temp files are removed and
/// the error is returned.
pub fn persist_all_atomically(files: &[(&Path, &[u8])]) -> AnalyticsResult<()> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(files.len());
    for (path, bytes) in files {
        let tmp = sibling(path, "partial");
        if let Err(e) = fs::write(&tmp, bytes) {
            staged.push(tmp);
            discard(&staged);
            return Err(e.into());
        }
        staged.push(tmp);
    }

    let mut committed: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(files.len());
    for ((path, _), tmp) in files.iter().zip(&staged) {
        match commit(path, tmp) {
            Ok(previous) => committed.push((path.to_path_buf(), previous)),
            Err(e) => {
                roll_back(&committed);
                discard(&staged);
                return Err(e.into());
            }
        }
    }

    for (_, previous) in committed {
        if let Some(previous) = previous {
            let _ = fs::remove_file(previous);
        }
    }
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!(".{file_name}.{suffix}"))
}

/// Move `tmp` over `path`, keeping the old file aside. Returns where the
/// old file went, if there was one.
fn commit(path: &Path, tmp: &Path) -> io::Result<Option<PathBuf>> {
    let previous = if path.is_file() {
        let aside = sibling(path, "previous");
        fs::rename(path, &aside)?;
        Some(aside)
    } else {
        None
    };
    if let Err(e) = fs::rename(tmp, path) {
        if let Some(aside) = &previous {
            let _ = fs::rename(aside, path);
        }
        return Err(e);
    }
    Ok(previous)
}

fn roll_back(committed: &[(PathBuf, Option<PathBuf>)]) {
    for (path, previous) in committed.iter().rev() {
        let _ = match previous {
            Some(aside) => fs::rename(aside, path),
            None => fs::remove_file(path),
        };
    }
}

fn discard(staged: &[PathBuf]) {
    for tmp in staged {
        let _ = fs::remove_file(tmp);
    }
}

pub fn export_to_path<R: CsvRecord>(
    path: &Path,
    records: &[R],
    delimiter: u8,
) -> AnalyticsResult<usize> {
    let bytes = render_records(records, delimiter)?;
    persist_atomically(path, &bytes)?;
    log::info!("Exported {} rows to {}", records.len(), path.display());
    Ok(records.len())
}

/// Re-import a `customer_segments` export.
pub fn read_customer_segments<R: Read>(
    source: R,
    delimiter: u8,
) -> AnalyticsResult<Vec<CustomerSegment>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);
    let rows = reader
        .deserialize::<CustomerSegment>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
