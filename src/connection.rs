// SQLite connection pool backing the task store

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;

/// Pool of SQLite connections shared by every store handle
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Pool and per-connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Maximum number of open connections
    pub pool_size: u32,
    /// How long SQLite waits on a locked database before failing
    pub busy_timeout_ms: u32,
    /// How long a checkout waits for a free connection
    pub connection_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 16,
            busy_timeout_ms: 30_000,
            connection_timeout_secs: 5,
        }
    }
}

/// Runs on every new connection so foreign keys are always enforced.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {};\
             PRAGMA journal_mode = WAL;\
             PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
    }
}

/// Open a file-backed pool, creating the database file if needed.
pub fn open_pool<P: AsRef<Path>>(path: P, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let path = path.as_ref();
    debug!(path = %path.display(), pool_size = config.pool_size, "open_pool: called");

    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
        }))
        .build(manager)?;

    Ok(pool)
}

/// Whether foreign key enforcement is on for this connection
pub(crate) fn foreign_keys_enabled(conn: &Connection) -> Result<bool> {
    let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    Ok(enabled == 1)
}
