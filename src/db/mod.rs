// SQLite handle shared by the audit ledger and receipt rows
// One connection behind a lock; the schema is applied by migrations at open

use rusqlite::{Connection, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub mod migrations;

use migrations::run_migrations;

/// The connection mutex only poisons if a caller panicked mid-statement, so
/// this is surfaced to the caller rather than recovered.
#[derive(Debug, Error)]
#[error("database connection lock poisoned")]
pub struct LockPoisoned;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        run_migrations(&conn)?;
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the locked connection. The lock is held for the
    /// duration of the closure, so statement preparation and row iteration
    /// stay on one connection without the caller touching the mutex.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> T,
    ) -> std::result::Result<T, LockPoisoned> {
        let guard = self.conn.lock().map_err(|_| LockPoisoned)?;
        Ok(f(&guard))
    }
}
