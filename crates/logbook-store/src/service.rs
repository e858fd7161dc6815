// ABOUTME: JournalService ties parsing, dedup, bulk ingest, and page queries into the two journal operations.
// ABOUTME: save_journal_logs ingests a newline-delimited blob; get_log_page reads one page back.

use logbook_core::{LogRecord, PageRequest, parse_journal};
use serde::Serialize;

use crate::dedup::DedupFilter;
use crate::error::JournalError;
use crate::query::PageQueryEngine;
use crate::store::JournalStore;
use crate::writer::BulkIngestWriter;

/// Outcome of one ingest call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Lines that parsed into candidates.
    pub parsed: usize,
    /// Candidates dropped because their hash was already stored.
    pub already_stored: usize,
    /// Rows actually inserted.
    pub written: usize,
}

#[derive(Clone)]
pub struct JournalService {
    store: JournalStore,
    dedup: DedupFilter,
    writer: BulkIngestWriter,
    pages: PageQueryEngine,
}

impl JournalService {
    pub fn new(store: JournalStore) -> Self {
        Self {
            dedup: DedupFilter::new(store.clone()),
            writer: BulkIngestWriter::new(store.clone()),
            pages: PageQueryEngine::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &JournalStore {
        &self.store
    }

    /// Parse `blob`, drop lines that are already stored, and write the rest
    /// in one transaction. Malformed lines are skipped, never fatal.
    pub async fn save_journal_logs(&self, blob: &str) -> Result<IngestReport, JournalError> {
        let candidates = parse_journal(blob, &self.store.location());
        let parsed = candidates.len();

        let fresh = self.dedup.filter(candidates).await?;
        let already_stored = parsed - fresh.len();

        let written = self.writer.write(fresh).await?;

        Ok(IngestReport {
            parsed,
            already_stored,
            written,
        })
    }

    /// One page of records, oldest first. The next cursor is the ordinal of
    /// the last record returned.
    pub async fn get_log_page(&self, request: PageRequest) -> Result<Vec<LogRecord>, JournalError> {
        self.pages.get_page(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolConfig;
    use chrono::{DateTime, FixedOffset, Utc};
    use logbook_core::Location;
    use tempfile::TempDir;

    fn open_service(dir: &TempDir) -> JournalService {
        let store = JournalStore::open(
            &dir.path().join("journal.db"),
            PoolConfig::default(),
            Location::resolve("UTC"),
        )
        .unwrap();
        JournalService::new(store)
    }

    fn at(micros: i64) -> DateTime<FixedOffset> {
        DateTime::<Utc>::from_timestamp_micros(micros).unwrap().fixed_offset()
    }

    fn whole_range(limit: u32) -> PageRequest {
        PageRequest {
            start: Some(at(0)),
            end: Some(at(i64::from(i32::MAX) * 1_000_000)),
            limit: Some(limit),
            ..PageRequest::default()
        }
    }

    #[tokio::test]
    async fn ingest_then_page() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);
        let blob = concat!(
            r#"{"__REALTIME_TIMESTAMP":"1000000","_HOSTNAME":"a"}"#,
            "\n",
            r#"{"__REALTIME_TIMESTAMP":"2000000","_HOSTNAME":"b"}"#,
        );

        let report = service.save_journal_logs(blob).await.unwrap();
        assert_eq!(
            report,
            IngestReport {
                parsed: 2,
                already_stored: 0,
                written: 2
            }
        );

        let mut request = PageRequest {
            start: Some(at(0)),
            end: Some(at(10_000_000)),
            limit: Some(1),
            ..PageRequest::default()
        };
        let first = service.get_log_page(request.clone()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].host(), Some("a"));

        request.cursor = first[0].ordinal;
        let second = service.get_log_page(request).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].host(), Some("b"));
    }

    #[tokio::test]
    async fn ingestion_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);
        let blob = "{\"__REALTIME_TIMESTAMP\":\"1\"}\n{\"__REALTIME_TIMESTAMP\":\"2\"}";

        service.save_journal_logs(blob).await.unwrap();
        let again = service.save_journal_logs(blob).await.unwrap();

        assert_eq!(again.already_stored, 2);
        assert_eq!(again.written, 0);
        assert_eq!(service.store().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn overlapping_blob_writes_only_new_lines() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);

        service
            .save_journal_logs("{\"__REALTIME_TIMESTAMP\":\"1\"}")
            .await
            .unwrap();
        let report = service
            .save_journal_logs("{\"__REALTIME_TIMESTAMP\":\"1\"}\n{\"__REALTIME_TIMESTAMP\":\"2\"}")
            .await
            .unwrap();

        assert_eq!(report.parsed, 2);
        assert_eq!(report.already_stored, 1);
        assert_eq!(report.written, 1);
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);
        let blob = concat!(
            "not json\n",
            r#"{"__REALTIME_TIMESTAMP":"1000000","MESSAGE":"kept"}"#,
            "\n",
            r#"{"MESSAGE":"no timestamp"}"#,
            "\n",
            r#"{"__REALTIME_TIMESTAMP":"soon"}"#,
            "\n\n",
        );

        let report = service.save_journal_logs(blob).await.unwrap();

        assert_eq!(report.parsed, 1);
        assert_eq!(report.written, 1);
        let page = service.get_log_page(whole_range(10)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].message(), Some("kept"));
    }

    #[tokio::test]
    async fn empty_blob_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);

        let report = service.save_journal_logs("").await.unwrap();

        assert_eq!(report, IngestReport::default());
        assert_eq!(service.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_identical_ingests_store_each_line_once() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);
        let blob: String = (1..=20)
            .map(|i| format!("{{\"__REALTIME_TIMESTAMP\":\"{}\"}}", i))
            .collect::<Vec<_>>()
            .join("\n");

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let service = service.clone();
            let blob = blob.clone();
            tasks.push(tokio::spawn(async move { service.save_journal_logs(&blob).await }));
        }
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => {}
                Err(e) => assert!(e.is_conflict(), "unexpected error: {e}"),
            }
        }

        assert_eq!(service.store().count().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn closed_store_fails_with_existence_check() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);
        service.store().close();

        let err = service
            .save_journal_logs("{\"__REALTIME_TIMESTAMP\":\"1\"}")
            .await
            .unwrap_err();

        assert!(matches!(err, JournalError::ExistenceCheckFailed(_)));
    }
}
