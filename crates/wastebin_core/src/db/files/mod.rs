//! Flat-file backend: sharded record files plus an in-memory name index.

/// In-memory ordered name index.
pub mod index;
/// Record framing.
pub mod record;
/// Raw sharded file operations.
pub mod store;

pub use index::NameIndex;
pub use store::{FileStore, RemoveError};

use super::lock::{acquire_owner_lock, OwnerLockGuard};
use super::PasteStore;
use crate::error::AppError;
use std::path::{Path, PathBuf};

/// Flat-file paste store.
///
/// Writes and deletes are not serialized against each other: two writers to
/// the same name race at the final rename and the last rename wins. The index
/// is updated only after the file operation it mirrors has succeeded (write)
/// or before the file is touched (delete).
pub struct FileDb {
    files: FileStore,
    index: NameIndex,
    _owner: OwnerLockGuard,
}

impl FileDb {
    /// Open a store rooted at `root` without scanning it.
    ///
    /// Call [`FileDb::rebuild_index`] before serving listings.
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] when the root cannot be created
    /// or is owned by another process.
    pub fn open_unindexed(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        let owner = acquire_owner_lock(&root)?;
        tracing::debug!("Acquired store lock {:?}", owner.path());
        Ok(Self {
            files: FileStore::new(root),
            index: NameIndex::new(),
            _owner: owner,
        })
    }

    /// Open a store and build its index from disk.
    ///
    /// # Errors
    /// See [`FileDb::open_unindexed`] and [`FileStore::scan`].
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let db = Self::open_unindexed(root)?;
        db.rebuild_index()?;
        Ok(db)
    }

    pub fn root(&self) -> &Path {
        self.files.root()
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    /// Scan disk and merge every found name into the index.
    ///
    /// Safe to run while requests are served: names written concurrently are
    /// never dropped.
    ///
    /// # Returns
    /// Number of records found on disk.
    pub fn rebuild_index(&self) -> Result<usize, AppError> {
        let names: Vec<String> = self.files.scan()?.into_iter().map(|(n, _)| n).collect();
        let count = names.len();
        self.index.merge(names);
        tracing::info!("Indexed {} paste(s) under {:?}", count, self.root());
        Ok(count)
    }

    /// Scan disk and replace the index with exactly what was found.
    ///
    /// This is the repair path after [`AppError::IndexInconsistency`].
    pub fn repair_index(&self) -> Result<usize, AppError> {
        let names: Vec<String> = self.files.scan()?.into_iter().map(|(n, _)| n).collect();
        let count = names.len();
        self.index.replace(names);
        tracing::warn!("Replaced name index with {} scanned paste(s)", count);
        Ok(count)
    }
}

impl PasteStore for FileDb {
    fn read(&self, name: &str) -> Result<String, AppError> {
        self.files.read(name)
    }

    fn write(&self, name: &str, content: &str) -> Result<(), AppError> {
        let path = self.files.write(name, content)?;
        self.index.insert(name);
        tracing::debug!("Wrote paste '{}' to {:?}", name, path);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), AppError> {
        self.index.remove(name);
        match self.files.remove(name) {
            Ok(()) => {
                tracing::debug!("Deleted paste '{}'", name);
                Ok(())
            }
            Err(RemoveError::NotFound) => Err(AppError::NotFound),
            Err(RemoveError::Cleanup(err)) => Err(AppError::StorageUnavailable(format!(
                "Deleted '{}' but shard cleanup failed: {}",
                name, err
            ))),
            Err(RemoveError::Io(err)) => match self.files.exists(name) {
                Ok(true) => {
                    self.index.insert(name);
                    Err(AppError::StorageUnavailable(format!(
                        "Failed to delete '{}': {}",
                        name, err
                    )))
                }
                Ok(false) => Ok(()),
                Err(exists_err) => {
                    tracing::error!(
                        "Index dropped '{}' but file state is unknown ({}; exists check: {}); rescan required",
                        name,
                        err,
                        exists_err
                    );
                    Err(AppError::IndexInconsistency(format!(
                        "'{}' removed from index, file state unknown: {}",
                        name, err
                    )))
                }
            },
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        Ok(self.index.with_prefix(prefix))
    }
}
