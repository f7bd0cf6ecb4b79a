//! Local tree adapter backed by an embedded redb file.

use super::TreeAdapter;
use crate::db::tables::PASTES;
use crate::error::AppError;
use redb::ReadableDatabase;
use std::path::{Path, PathBuf};

/// redb B-tree with copy-on-write commits; a crash mid-commit leaves the
/// previous committed state intact.
pub struct RedbAdapter {
    db: redb::Database,
    path: PathBuf,
}

impl RedbAdapter {
    /// Open or create the database file and its paste table.
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] when the parent directory or
    /// the database file cannot be created, or the file is locked by another
    /// process.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(PASTES)?;
        write_txn.commit()?;

        tracing::info!("Opened redb tree at {:?}", path);
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TreeAdapter for RedbAdapter {
    fn kind(&self) -> &'static str {
        "redb"
    }

    fn get(&self, name: &str) -> Result<Option<String>, AppError> {
        let read_txn = self.db.begin_read()?;
        let pastes = read_txn.open_table(PASTES)?;
        let content = pastes.get(name)?.map(|guard| guard.value().to_string());
        Ok(content)
    }

    fn upsert(&self, name: &str, content: &str) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut pastes = write_txn.open_table(PASTES)?;
            pastes.insert(name, content)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut pastes = write_txn.open_table(PASTES)?;
            let removed = pastes.remove(name)?;
            removed.is_some()
        };
        if existed {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(existed)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let read_txn = self.db.begin_read()?;
        let pastes = read_txn.open_table(PASTES)?;
        let mut names = Vec::new();
        for item in pastes.range(prefix..)? {
            let (key, _) = item?;
            let name = key.value();
            if !name.starts_with(prefix) {
                break;
            }
            names.push(name.to_string());
        }
        Ok(names)
    }

    fn close(self: Box<Self>) -> Result<(), AppError> {
        tracing::info!("Closing redb tree at {:?}", self.path);
        drop(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn upsert_replaces_and_remove_reports_presence() {
        let temp = TempDir::new().expect("temp dir");
        let adapter = RedbAdapter::open(&temp.path().join("nested").join("data.redb"))
            .expect("open");

        adapter.upsert("k", "v1").expect("insert");
        adapter.upsert("k", "v2").expect("replace");
        assert_eq!(adapter.get("k").expect("get").as_deref(), Some("v2"));

        assert!(adapter.remove("k").expect("remove"));
        assert!(!adapter.remove("k").expect("remove again"));
        assert_eq!(adapter.get("k").expect("get"), None);
    }

    #[test]
    fn committed_rows_survive_reopen() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("data.redb");
        {
            let adapter = RedbAdapter::open(&path).expect("open");
            adapter.upsert("persist/me", "yes").expect("insert");
            Box::new(adapter).close().expect("close");
        }
        let reopened = RedbAdapter::open(&path).expect("reopen");
        assert_eq!(reopened.get("persist/me").expect("get").as_deref(), Some("yes"));
        assert_eq!(reopened.scan_prefix("").expect("scan"), vec!["persist/me"]);
    }
}
