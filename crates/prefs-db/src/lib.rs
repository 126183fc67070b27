//! SQLite-backed preference store for the push daemon.
//!
//! A single connection sits behind a mutex; every call takes the lock for
//! the duration of one statement or one transaction.

pub mod schema;
pub mod settings;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, Transaction};

pub use settings::{PreferenceRow, SETTING_TYPES};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the store at `path` and bring its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Opening preference store");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, DbError> {
        // journal_mode answers with a row, so it goes through query_row.
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        schema::run_migrations(&conn)?;
        tracing::trace!(journal_mode = %mode, "Preference store ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Run `f` against the connection.
    pub fn read<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&Connection) -> Result<R, DbError>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside a transaction, committing when it returns `Ok`.
    pub fn transaction<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R, DbError>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Preference store lock poisoned")]
    LockPoisoned,

    #[error("Preference not found: {0}")]
    NotFound(String),

    #[error("Invalid preference: {0}")]
    InvalidData(String),
}
