// ABOUTME: Persistence layer for logbook, storing journal records in SQLite.
// ABOUTME: Provides the bounded connection pool, hash dedup, bulk ingest, and keyset page queries.

pub mod dedup;
pub mod error;
pub mod pool;
pub mod query;
pub mod service;
pub mod store;
pub mod writer;

pub use dedup::DedupFilter;
pub use error::{JournalError, StoreError};
pub use pool::{ConnectionPool, PoolConfig};
pub use query::PageQueryEngine;
pub use service::{IngestReport, JournalService};
pub use store::JournalStore;
pub use writer::BulkIngestWriter;
