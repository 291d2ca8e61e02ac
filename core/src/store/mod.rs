//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! Analytics components receive transaction slices and never execute SQL.

use crate::error::AnalyticsResult;
use rusqlite::Connection;

mod report_run;
mod transaction;

pub struct TxnStore {
    conn: Connection,
}

impl TxnStore {
    pub fn open(path: &str) -> AnalyticsResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // Has no effect on :memory: databases.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AnalyticsResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> AnalyticsResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_transactions.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_report_run.sql"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRunRecord {
    pub run_id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub input_rows: i64,
    pub status: String,
    pub summary_json: Option<String>,
}
