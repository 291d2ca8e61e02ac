use super::TxnStore;
use crate::{
    error::AnalyticsResult,
    transaction::{Transaction, TxnType},
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, types::Type, Row};

const TXN_COLUMNS: &str = "txn_id, step, txn_type, amount, origin_id,
    old_balance_orig, new_balance_orig, dest_id, old_balance_dest, new_balance_dest,
    is_fraud, is_flagged_fraud, ts";

impl TxnStore {
    // ── Transactions ───────────────────────────────────────────────

    /// Insert every transaction inside one SQLite transaction: either all
    /// rows are stored or none are. Ids are assigned by the store.
    pub fn insert_transactions(&self, txns: &[Transaction]) -> AnalyticsResult<usize> {
        self.write_transactions(txns, false)
    }

    /// Delete the stored set and insert `txns` in its place, atomically.
    /// On failure the previous set is kept.
    pub fn replace_transactions(&self, txns: &[Transaction]) -> AnalyticsResult<usize> {
        self.write_transactions(txns, true)
    }

    fn write_transactions(&self, txns: &[Transaction], clear_first: bool) -> AnalyticsResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        if clear_first {
            let removed = tx.execute("DELETE FROM transactions", [])?;
            log::debug!("Replacing {removed} stored transactions");
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO transactions (
                    step, txn_type, amount, origin_id,
                    old_balance_orig, new_balance_orig, dest_id,
                    old_balance_dest, new_balance_dest,
                    is_fraud, is_flagged_fraud, ts
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for t in txns {
                stmt.execute(params![
                    t.step,
                    t.txn_type.as_str(),
                    t.amount,
                    &t.origin_id,
                    t.old_balance_orig,
                    t.new_balance_orig,
                    &t.dest_id,
                    t.old_balance_dest,
                    t.new_balance_dest,
                    if t.is_fraud { 1 } else { 0 },
                    if t.is_flagged_fraud { 1 } else { 0 },
                    t.timestamp.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(txns.len())
    }

    pub fn all_transactions(&self) -> AnalyticsResult<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions ORDER BY txn_id ASC"
        ))?;
        let rows = stmt.query_map([], map_transaction)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Transactions whose timestamp falls on `date` (UTC calendar day).
    pub fn transactions_on_date(&self, date: NaiveDate) -> AnalyticsResult<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions
             WHERE substr(ts, 1, 10) = ?1
             ORDER BY txn_id ASC"
        ))?;
        let rows = stmt.query_map(params![date.format("%Y-%m-%d").to_string()], map_transaction)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn fraudulent_transactions(&self) -> AnalyticsResult<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions
             WHERE is_fraud = 1
             ORDER BY txn_id ASC"
        ))?;
        let rows = stmt.query_map([], map_transaction)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn transaction_count(&self) -> AnalyticsResult<i64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn fraud_count(&self) -> AnalyticsResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE is_fraud = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let txn_type: String = row.get(2)?;
    let txn_type: TxnType = txn_type
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let ts: String = row.get(12)?;
    let timestamp = DateTime::parse_from_rfc3339(&ts)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

    Ok(Transaction {
        txn_id: row.get(0)?,
        step: row.get(1)?,
        txn_type,
        amount: row.get(3)?,
        origin_id: row.get(4)?,
        old_balance_orig: row.get(5)?,
        new_balance_orig: row.get(6)?,
        dest_id: row.get(7)?,
        old_balance_dest: row.get(8)?,
        new_balance_dest: row.get(9)?,
        is_fraud: row.get::<_, i32>(10)? != 0,
        is_flagged_fraud: row.get::<_, i32>(11)? != 0,
        timestamp,
    })
}
