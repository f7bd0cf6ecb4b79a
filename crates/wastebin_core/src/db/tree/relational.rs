//! Relational tree adapter over SQLite, selected by a `sqlite://` URI.
//!
//! The primary-key B-tree provides the ordering; `BINARY` collation compares
//! UTF-8 bytes, which matches Rust `str` ordering.

use super::TreeAdapter;
use crate::constants::SQLITE_BUSY_TIMEOUT_MS;
use crate::error::AppError;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const MEMORY_LOCATION: &str = ":memory:";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS pastes (
    name TEXT PRIMARY KEY NOT NULL,
    content TEXT NOT NULL
) WITHOUT ROWID;";

/// SQLite-backed adapter. Lock waits longer than the busy timeout surface as
/// [`AppError::Conflict`].
pub struct SqliteAdapter {
    conn: Mutex<Connection>,
    location: String,
}

impl SqliteAdapter {
    /// Open the database at `location` (a file path or `:memory:`).
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] when the database cannot be
    /// opened or the schema cannot be created.
    pub fn open(location: &str) -> Result<Self, AppError> {
        let conn = if location == MEMORY_LOCATION {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(location).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let conn = Connection::open(location)?;
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
            conn
        };
        conn.busy_timeout(Duration::from_millis(SQLITE_BUSY_TIMEOUT_MS))?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!("Opened sqlite tree at {}", location);
        Ok(Self {
            conn: Mutex::new(conn),
            location: location.to_string(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::StorageUnavailable("SQLite connection lock poisoned".to_string()))
    }
}

impl TreeAdapter for SqliteAdapter {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn get(&self, name: &str) -> Result<Option<String>, AppError> {
        let conn = self.conn()?;
        let content = conn
            .query_row(
                "SELECT content FROM pastes WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    fn upsert(&self, name: &str, content: &str) -> Result<(), AppError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO pastes (name, content) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET content = excluded.content",
            params![name, content],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<bool, AppError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM pastes WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM pastes WHERE name >= ?1 ORDER BY name")?;
        let mut rows = stmt.query(params![prefix])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            if !name.starts_with(prefix) {
                break;
            }
            names.push(name);
        }
        Ok(names)
    }

    fn close(self: Box<Self>) -> Result<(), AppError> {
        tracing::info!("Closing sqlite tree at {}", self.location);
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| AppError::StorageUnavailable("SQLite connection lock poisoned".to_string()))?;
        conn.close().map_err(|(_, err)| err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn prefix_scan_seeks_and_stops() {
        let adapter = SqliteAdapter::open(MEMORY_LOCATION).expect("open");
        for name in ["b", "a/2", "a/1", "ab", "a"] {
            adapter.upsert(name, name).expect("insert");
        }
        assert_eq!(
            adapter.scan_prefix("a/").expect("scan"),
            vec!["a/1", "a/2"]
        );
        assert_eq!(
            adapter.scan_prefix("").expect("scan"),
            vec!["a", "a/1", "a/2", "ab", "b"]
        );
    }

    #[test]
    fn held_write_lock_surfaces_as_conflict() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("pastes.db");
        let location = path.to_str().expect("utf-8 path");
        let adapter = SqliteAdapter::open(location).expect("open");

        let other = Connection::open(location).expect("second connection");
        other.execute_batch("BEGIN IMMEDIATE;").expect("hold write lock");

        let err = adapter.upsert("blocked", "x").expect_err("writer must be blocked");
        assert!(matches!(err, AppError::Conflict(_)), "unexpected error: {}", err);

        other.execute_batch("COMMIT;").expect("release write lock");
        adapter.upsert("blocked", "x").expect("write after release");
        assert_eq!(adapter.get("blocked").expect("get").as_deref(), Some("x"));
    }

    #[test]
    fn close_releases_file_database() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("sub").join("pastes.db");
        let location = path.to_str().expect("utf-8 path");
        let adapter = SqliteAdapter::open(location).expect("open");
        adapter.upsert("kept", "1").expect("insert");
        Box::new(adapter).close().expect("close");

        let reopened = SqliteAdapter::open(location).expect("reopen");
        assert_eq!(reopened.get("kept").expect("get").as_deref(), Some("1"));
    }
}
