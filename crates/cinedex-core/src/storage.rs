use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::CinedexError;

const SCHEMA_V1: &str = include_str!("../../../migrations/001_kv_store.sql");

/// Port to the local persistent key-value medium.
///
/// Values are opaque text blobs. Every write replaces the whole value for a
/// key; there is no cross-process locking, so concurrent writers to the
/// same medium are last-writer-wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CinedexError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CinedexError>;

    /// Delete the key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), CinedexError>;
}

/// SQLite-backed key-value store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, CinedexError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, CinedexError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, CinedexError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(keys)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, CinedexError> {
        self.conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(Into::into)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CinedexError> {
        self.conn().execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CinedexError> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Process-local store for embedding without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CinedexError> {
        Ok(self.map().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CinedexError> {
        self.map().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CinedexError> {
        self.map().remove(key);
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, CinedexError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CinedexError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CinedexError> {
        (**self).remove(key)
    }
}

// ── Migrations ──────────────────────────────────────────────────

/// Run schema migrations using `PRAGMA user_version` for version tracking.
fn run_migrations(conn: &Connection) -> Result<(), CinedexError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}
