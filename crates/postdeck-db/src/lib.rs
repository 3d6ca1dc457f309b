pub mod mem;
pub mod migrations;
mod queries;
pub mod sqlite;
pub mod storage;

#[cfg(test)]
mod testutil;

pub use mem::MemStorage;
pub use sqlite::SqliteStorage;
pub use storage::Storage;

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.with_conn(f)
    }
}

/// Pick the store that backs the process, once, at startup.
///
/// A configured database path that opens selects SQLite; anything else
/// falls back to the in-memory demo store so the app stays usable in
/// development.
pub fn connect(db_path: Option<&Path>) -> Arc<dyn Storage> {
    match db_path {
        Some(path) => match SqliteStorage::open(path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(
                    "Could not open database at {}: {e:#}; falling back to in-memory store",
                    path.display()
                );
                Arc::new(MemStorage::demo())
            }
        },
        None => {
            info!("No database path configured; using in-memory store with demo data");
            Arc::new(MemStorage::demo())
        }
    }
}
