// ABOUTME: Bounded pool of SQLite connections shared by every journal operation.
// ABOUTME: Callers past the size limit wait up to the connect timeout, then fail.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::StoreError;

/// Connection pool limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of physical connections checked out at once.
    pub max_size: usize,
    /// How long to wait for a free connection; also the SQLite busy timeout.
    pub connect_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 4,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

type IdleList = Arc<Mutex<Vec<Connection>>>;

/// A bounded set of connections to one database file. Connections are opened
/// lazily and kept idle for reuse after release.
pub struct ConnectionPool {
    path: PathBuf,
    config: PoolConfig,
    permits: Arc<Semaphore>,
    idle: IdleList,
}

impl ConnectionPool {
    pub fn new(path: &Path, config: PoolConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            config,
            permits: Arc::new(Semaphore::new(config.max_size)),
            idle: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// Open a configured connection outside the pool's accounting.
    pub fn connect(&self) -> Result<Connection, StoreError> {
        open_connection(&self.path, self.config.connect_timeout)
    }

    /// Check out a connection, waiting at most `connect_timeout` for a free slot.
    pub async fn acquire(&self) -> Result<PooledConnection, StoreError> {
        let timeout = self.config.connect_timeout;
        let permit = tokio::time::timeout(timeout, Arc::clone(&self.permits).acquire_owned())
            .await
            .map_err(|_| StoreError::PoolTimeout(timeout))?
            .map_err(|_| StoreError::PoolClosed)?;

        let reused = self.idle.lock().ok().and_then(|mut idle| idle.pop());
        let conn = match reused {
            Some(conn) => conn,
            None => self.connect()?,
        };

        Ok(PooledConnection {
            conn: Some(conn),
            idle: Arc::clone(&self.idle),
            permits: Arc::clone(&self.permits),
            _permit: permit,
        })
    }

    /// Return a connection that was opened with `connect` to the idle list.
    pub fn release(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(conn);
        }
    }

    /// Refuse new checkouts and drop idle connections. Connections already
    /// checked out are closed when their holders release them.
    pub fn close(&self) {
        self.permits.close();
        if let Ok(mut idle) = self.idle.lock() {
            idle.clear();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

/// A checked-out connection. Goes back to the idle list on drop.
pub struct PooledConnection {
    conn: Option<Connection>,
    idle: IdleList,
    permits: Arc<Semaphore>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection is present until drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection is present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take()
            && !self.permits.is_closed()
            && let Ok(mut idle) = self.idle.lock()
        {
            idle.push(conn);
        }
    }
}

fn open_connection(path: &Path, busy_timeout: Duration) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    tracing::debug!(path = %path.display(), "opened database connection");
    Ok(conn)
}
