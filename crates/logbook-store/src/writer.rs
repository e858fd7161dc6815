// ABOUTME: BulkIngestWriter persists a deduplicated batch in one all-or-nothing transaction.
// ABOUTME: Rows stream through a single cached INSERT; a unique-hash violation is a Conflict.

use std::collections::HashSet;

use logbook_core::LogCandidate;
use rusqlite::{Connection, ffi, params};

use crate::error::{JournalError, StoreError};
use crate::store::JournalStore;

const INSERT_SQL: &str = "INSERT INTO logs (time, hash, log) VALUES (?1, ?2, ?3)";

#[derive(Clone)]
pub struct BulkIngestWriter {
    store: JournalStore,
}

impl BulkIngestWriter {
    pub fn new(store: JournalStore) -> Self {
        Self { store }
    }

    /// Store every candidate and return how many rows were written. An empty
    /// batch returns 0 without touching the store. Repeated hashes within
    /// the batch are written once. On any failure nothing is written.
    pub async fn write(&self, candidates: Vec<LogCandidate>) -> Result<usize, JournalError> {
        if candidates.is_empty() {
            tracing::info!("no new logs to save");
            return Ok(0);
        }

        let rows = collapse_repeats(candidates);
        let written = self
            .store
            .run(move |conn| copy_rows(conn, &rows))
            .await
            .map_err(JournalError::WriteFailed)?;

        tracing::info!(count = written, "copied logs");
        Ok(written)
    }
}

/// Keep the first occurrence of each hash, preserving order.
fn collapse_repeats(candidates: Vec<LogCandidate>) -> Vec<LogCandidate> {
    let total = candidates.len();
    let mut seen = HashSet::with_capacity(total);
    let rows: Vec<LogCandidate> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.hash.clone()))
        .collect();

    if rows.len() < total {
        tracing::debug!(repeated = total - rows.len(), "collapsed repeated lines in batch");
    }
    rows
}

fn copy_rows(conn: &mut Connection, rows: &[LogCandidate]) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(INSERT_SQL)?;
        for row in rows {
            let log = serde_json::to_string(&row.fields)?;
            stmt.execute(params![row.time_micros(), row.hash, log])
                .map_err(|e| conflict_or_sqlite(e, &row.hash))?;
        }
    }
    tx.commit()?;
    Ok(rows.len())
}

fn conflict_or_sqlite(err: rusqlite::Error, hash: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::Conflict(hash.to_string())
        }
        _ => StoreError::Sqlite(err),
    }
}
