//! Paste storage engine: one contract, two backends.
//!
//! [`Database`] is built once from configuration and is the only type request
//! handlers see. It validates names, retries write conflicts a bounded number
//! of times and dispatches to exactly one backend.

/// Flat-file backend.
pub mod files;
/// Store ownership lock.
pub mod lock;
/// redb table definitions.
pub mod tables;
/// Transactional tree backend.
pub mod tree;

use crate::config::{BackendKind, Config, StorageTarget};
use crate::constants::{CONFLICT_BACKOFF_MS, MAX_CONFLICT_ATTEMPTS};
use crate::error::AppError;
use crate::naming::{is_valid_name, validate_name};
use files::FileDb;
use std::time::Duration;
use tree::{RedbAdapter, SqliteAdapter, TreeDb};

/// The paste storage contract.
///
/// Errors are always one of the [`AppError`] variants; `list` returns names in
/// ascending byte order.
pub trait PasteStore: Send + Sync {
    /// Content stored under `name`, or [`AppError::NotFound`].
    fn read(&self, name: &str) -> Result<String, AppError>;

    /// Create or wholly replace the paste `name`.
    fn write(&self, name: &str, content: &str) -> Result<(), AppError>;

    /// Remove `name`; [`AppError::NotFound`] when it does not exist.
    fn delete(&self, name: &str) -> Result<(), AppError>;

    /// Names starting with `prefix` (empty matches all), ascending.
    fn list(&self, prefix: &str) -> Result<Vec<String>, AppError>;
}

/// Process-wide paste store, selected once from configuration.
pub enum Database {
    Files(FileDb),
    Tree(TreeDb),
}

/// Run `op`, retrying while it reports [`AppError::Conflict`].
///
/// At most [`MAX_CONFLICT_ATTEMPTS`] attempts are made with a linear backoff;
/// the last conflict is returned unchanged.
pub fn with_conflict_retry<T, F>(label: &str, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Result<T, AppError>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Err(err) if err.is_retryable() && attempt < MAX_CONFLICT_ATTEMPTS => {
                tracing::debug!("{} conflicted (attempt {}): {}", label, attempt, err);
                std::thread::sleep(Duration::from_millis(CONFLICT_BACKOFF_MS * u64::from(attempt)));
                attempt += 1;
            }
            result => return result,
        }
    }
}

impl Database {
    /// Open the backend named by `config`.
    ///
    /// The flat-file index is built before returning unless
    /// `config.background_index` is set, in which case the caller is expected
    /// to run [`Database::rebuild_index`] itself.
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] for an invalid storage location
    /// or when the backend cannot be opened.
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let target = config.storage_target()?;
        tracing::info!("Opening storage: {}", target);
        Self::open_target(&target, !config.background_index)
    }

    /// Open a resolved storage target.
    ///
    /// `build_index` only affects the flat-file backend.
    pub fn open_target(target: &StorageTarget, build_index: bool) -> Result<Self, AppError> {
        Ok(match target {
            StorageTarget::Files { root } if build_index => Self::Files(FileDb::open(root.clone())?),
            StorageTarget::Files { root } => Self::Files(FileDb::open_unindexed(root.clone())?),
            StorageTarget::LocalTree { path } => {
                Self::Tree(TreeDb::new(Box::new(RedbAdapter::open(path)?)))
            }
            StorageTarget::Sqlite { location } => {
                Self::Tree(TreeDb::new(Box::new(SqliteAdapter::open(location)?)))
            }
        })
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            Self::Files(_) => BackendKind::Files,
            Self::Tree(_) => BackendKind::Tree,
        }
    }

    fn store(&self) -> &dyn PasteStore {
        match self {
            Self::Files(db) => db as &dyn PasteStore,
            Self::Tree(db) => db,
        }
    }

    /// Scan the flat-file store and merge found names into its index.
    ///
    /// # Returns
    /// Number of records found; `0` for the tree backend, which needs no index.
    pub fn rebuild_index(&self) -> Result<usize, AppError> {
        match self {
            Self::Files(db) => db.rebuild_index(),
            Self::Tree(_) => Ok(0),
        }
    }

    /// Replace the flat-file index with a fresh scan of disk.
    pub fn repair_index(&self) -> Result<usize, AppError> {
        match self {
            Self::Files(db) => db.repair_index(),
            Self::Tree(_) => Ok(0),
        }
    }

    /// Tear the backend down, closing connections and releasing locks.
    pub fn close(self) -> Result<(), AppError> {
        match self {
            Self::Files(db) => {
                tracing::info!("Releasing flat-file store at {:?}", db.root());
                drop(db);
                Ok(())
            }
            Self::Tree(db) => db.close(),
        }
    }
}

impl PasteStore for Database {
    fn read(&self, name: &str) -> Result<String, AppError> {
        if !is_valid_name(name) {
            return Err(AppError::NotFound);
        }
        with_conflict_retry("read", || self.store().read(name))
    }

    fn write(&self, name: &str, content: &str) -> Result<(), AppError> {
        validate_name(name)?;
        with_conflict_retry("write", || self.store().write(name, content))
    }

    fn delete(&self, name: &str) -> Result<(), AppError> {
        if !is_valid_name(name) {
            return Err(AppError::NotFound);
        }
        with_conflict_retry("delete", || self.store().delete(name))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        with_conflict_retry("list", || self.store().list(prefix))
    }
}

#[cfg(test)]
mod tests;
