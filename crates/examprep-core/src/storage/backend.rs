//! Raw key-value backends behind the [`Store`](super::Store).
//!
//! Backends deal in strings only. Typing, defaults and the silent-fallback
//! policy live one layer up.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::StorageError;

/// Persistence medium for the store.
///
/// `put_all` must be atomic: either every entry becomes visible or none does.
pub trait KvBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put_all(&mut self, entries: &[(String, String)]) -> Result<(), StorageError>;

    /// Remove every key.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// SQLite-backed kv table.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let backend = Self { conn };
        backend.migrate()?;
        Ok(backend)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let backend = Self { conn };
        backend.migrate()?;
        Ok(backend)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    /// Run `f` inside an immediate transaction, rolling back on error.
    fn in_transaction<F>(&self, f: F) -> Result<(), rusqlite::Error>
    where
        F: FnOnce(&Connection) -> Result<(), rusqlite::Error>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match f(&self.conn) {
            Ok(()) => self.conn.execute_batch("COMMIT;"),
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }
}

impl KvBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_all(&mut self, entries: &[(String, String)]) -> Result<(), StorageError> {
        self.in_transaction(|conn| {
            let mut stmt = conn.prepare("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)")?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.in_transaction(|conn| conn.execute("DELETE FROM kv", []).map(|_| ()))?;
        Ok(())
    }
}

/// Process-local backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn put_all(&mut self, entries: &[(String, String)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.values.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.values.clear();
        Ok(())
    }
}
