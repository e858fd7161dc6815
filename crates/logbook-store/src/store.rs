// ABOUTME: JournalStore, the persistence boundary shared by dedup, bulk ingest, and page queries.
// ABOUTME: Owns the SQLite schema and runs blocking database work off the async runtime.

use std::path::Path;
use std::sync::Arc;

use logbook_core::Location;
use rusqlite::Connection;

use crate::error::StoreError;
use crate::pool::{ConnectionPool, PoolConfig};

/// `time` holds UTC microseconds since the epoch; `log` holds the field map
/// as a JSON object. `AUTOINCREMENT` keeps ids from being reused.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        time INTEGER NOT NULL,
        hash TEXT NOT NULL UNIQUE,
        log TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS logs_time_id ON logs (time, id);
";

/// Handle to the journal database. Cheap to clone; clones share one pool.
#[derive(Clone)]
pub struct JournalStore {
    pool: Arc<ConnectionPool>,
    location: Location,
}

impl JournalStore {
    /// Open or create the journal database at `path` and ensure the schema
    /// exists. `location` is the zone stored timestamps are presented in.
    pub fn open(path: &Path, config: PoolConfig, location: Location) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::new(path, config);
        let conn = pool.connect()?;
        conn.execute_batch(SCHEMA)?;
        pool.release(conn);

        tracing::info!(
            path = %path.display(),
            max_connections = config.max_size,
            zone = location.name(),
            "journal store opened"
        );

        Ok(Self {
            pool: Arc::new(pool),
            location,
        })
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn pool_config(&self) -> PoolConfig {
        self.pool.config()
    }

    /// Run `op` on a pooled connection on the blocking thread pool.
    pub async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = self.pool.acquire().await?;
        tokio::task::spawn_blocking(move || op(&mut *conn))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<u64, StoreError> {
        self.run(|conn| {
            let n: i64 = conn.query_row("SELECT count(*) FROM logs", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
    }

    /// Stop handing out connections.
    pub fn close(&self) {
        self.pool.close();
        tracing::info!("journal store closed");
    }
}
