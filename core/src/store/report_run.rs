use super::{ReportRunRecord, TxnStore};
use crate::error::AnalyticsResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

impl TxnStore {
    // ── Report runs ────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        started_at: DateTime<Utc>,
        input_rows: i64,
    ) -> AnalyticsResult<()> {
        self.conn.execute(
            "INSERT INTO report_run (run_id, started_at, input_rows, status)
             VALUES (?1, ?2, ?3, 'running')
             ON CONFLICT(run_id) DO UPDATE SET
                started_at = excluded.started_at,
                input_rows = excluded.input_rows,
                status = 'running',
                completed_at = NULL,
                summary_json = NULL",
            params![run_id, started_at.to_rfc3339(), input_rows],
        )?;
        Ok(())
    }

    pub fn complete_run(
        &self,
        run_id: &str,
        completed_at: DateTime<Utc>,
        summary_json: &str,
    ) -> AnalyticsResult<()> {
        self.conn.execute(
            "UPDATE report_run SET status = 'completed', completed_at = ?1, summary_json = ?2
             WHERE run_id = ?3",
            params![completed_at.to_rfc3339(), summary_json, run_id],
        )?;
        Ok(())
    }

    pub fn fail_run(&self, run_id: &str, completed_at: DateTime<Utc>) -> AnalyticsResult<()> {
        self.conn.execute(
            "UPDATE report_run SET status = 'failed', completed_at = ?1 WHERE run_id = ?2",
            params![completed_at.to_rfc3339(), run_id],
        )?;
        Ok(())
    }

    pub fn get_run(&self, run_id: &str) -> AnalyticsResult<Option<ReportRunRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT run_id, started_at, completed_at, input_rows, status, summary_json
                 FROM report_run WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok(ReportRunRecord {
                        run_id: row.get(0)?,
                        started_at: row.get(1)?,
                        completed_at: row.get(2)?,
                        input_rows: row.get(3)?,
                        status: row.get(4)?,
                        summary_json: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn run_count(&self, status: &str) -> AnalyticsResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM report_run WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
