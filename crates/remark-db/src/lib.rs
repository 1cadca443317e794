pub mod comments;
pub mod content;
pub mod error;
pub mod migrations;
pub mod models;
pub mod reactions;
pub mod users;

use anyhow::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

pub use error::{Conflict, StoreError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite store backing the user directory, comment store and
/// reaction ledger.
///
/// All access goes through a single connection behind a mutex; callers on the
/// async runtime are expected to wrap calls in `spawn_blocking`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Reactions and comments rely on ON DELETE CASCADE.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        // Other processes may hold the write lock on a shared file.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Like [`Database::with_conn`] but hands out `&mut` so the closure can
    /// open a transaction.
    pub fn with_conn_mut<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Connection) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&mut conn)
    }
}

/// Begins a transaction holding the write lock from the start. Every
/// check-then-write path uses this so a second connection to the same file
/// waits on the busy timeout instead of failing its read-to-write upgrade
/// with `SQLITE_BUSY`.
pub(crate) fn begin_write(conn: &mut Connection) -> rusqlite::Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
}
