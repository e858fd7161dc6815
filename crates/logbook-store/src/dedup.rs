// ABOUTME: DedupFilter drops candidates whose content hash is already stored.
// ABOUTME: Checks a whole batch with one query and skips the query for empty batches.

use std::collections::{BTreeSet, HashSet};

use logbook_core::LogCandidate;

use crate::error::{JournalError, StoreError};
use crate::store::JournalStore;

/// Candidate hashes are bound as a single JSON array, so the statement does
/// not grow with the batch and never hits SQLite's variable limit.
const EXISTING_HASHES_SQL: &str =
    "SELECT hash FROM logs WHERE hash IN (SELECT value FROM json_each(?1))";

#[derive(Clone)]
pub struct DedupFilter {
    store: JournalStore,
}

impl DedupFilter {
    pub fn new(store: JournalStore) -> Self {
        Self { store }
    }

    /// Which of `hashes` are already persisted.
    pub async fn existing_hashes(
        &self,
        hashes: &BTreeSet<String>,
    ) -> Result<HashSet<String>, JournalError> {
        if hashes.is_empty() {
            return Ok(HashSet::new());
        }

        let param = serde_json::to_string(hashes)
            .map_err(|e| JournalError::ExistenceCheckFailed(StoreError::Json(e)))?;

        self.store
            .run(move |conn| {
                let mut stmt = conn.prepare_cached(EXISTING_HASHES_SQL)?;
                let rows = stmt.query_map([param], |row| row.get::<_, String>(0))?;
                let mut existing = HashSet::new();
                for row in rows {
                    existing.insert(row?);
                }
                Ok(existing)
            })
            .await
            .map_err(JournalError::ExistenceCheckFailed)
    }

    /// Remove candidates that are already stored. Repeats inside the batch
    /// itself are left for the writer to collapse.
    pub async fn filter(
        &self,
        candidates: Vec<LogCandidate>,
    ) -> Result<Vec<LogCandidate>, JournalError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let hashes: BTreeSet<String> = candidates.iter().map(|c| c.hash.clone()).collect();
        let existing = self.existing_hashes(&hashes).await?;

        tracing::debug!(
            candidates = candidates.len(),
            already_stored = existing.len(),
            "checked journal hashes"
        );

        if existing.is_empty() {
            return Ok(candidates);
        }

        Ok(candidates
            .into_iter()
            .filter(|c| !existing.contains(&c.hash))
            .collect())
    }
}
