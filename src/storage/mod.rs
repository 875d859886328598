//! Durable key-value storage for the client session.
//!
//! The session layer only needs string keys and string values that survive
//! a restart, so the contract is a tiny [`KeyValueStore`] trait. The shipped
//! implementation is [`SqliteStore`].

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the serialized [`crate::models::User`].
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine data directory")]
    NoDataDir,

    #[error("migration {version} ({name}) failed: {source}")]
    Migration {
        version: &'static str,
        name: &'static str,
        source: rusqlite::Error,
    },
}

/// Synchronous string-to-string store that outlives the process.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// SQLite-backed [`KeyValueStore`].
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: PathBuf) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!(path = %path.display(), "opened session store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("storage lock poisoned");
        schema::run_migrations(&conn)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock().expect("storage lock poisoned");
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("storage lock poisoned");
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, &now),
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("storage lock poisoned");
        conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }
}

/// `<data_dir>/notekeeper/session.db`
pub fn default_path() -> Result<PathBuf, StorageError> {
    let dirs = directories::ProjectDirs::from("", "", "notekeeper").ok_or(StorageError::NoDataDir)?;
    Ok(dirs.data_dir().join("session.db"))
}
