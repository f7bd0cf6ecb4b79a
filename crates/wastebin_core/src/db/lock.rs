//! Exclusive owner lock for a flat-file store root.

use crate::constants::STORE_LOCK_FILE_NAME;
use crate::error::AppError;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Keeping this value alive holds an exclusive OS lock on `<root>/.wastebin.lock`.
#[derive(Debug)]
pub struct OwnerLockGuard {
    file: File,
    lock_path: PathBuf,
}

impl OwnerLockGuard {
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for OwnerLockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::warn!(
                "Failed to release store lock {:?} during drop: {}",
                self.lock_path,
                err
            );
        }
    }
}

/// Return the owner lock file path for a store root.
pub fn owner_lock_path(root: &Path) -> PathBuf {
    root.join(STORE_LOCK_FILE_NAME)
}

/// Acquire and hold an exclusive owner lock on a store root.
///
/// # Returns
/// [`OwnerLockGuard`] that keeps the lock held until dropped.
///
/// # Errors
/// Returns [`AppError::StorageUnavailable`] when the root cannot be created or
/// another process already owns the store.
pub fn acquire_owner_lock(root: &Path) -> Result<OwnerLockGuard, AppError> {
    fs::create_dir_all(root).map_err(|err| {
        AppError::StorageUnavailable(format!(
            "Failed to prepare store root '{}': {}",
            root.display(),
            err
        ))
    })?;
    let lock_path = owner_lock_path(root);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|err| {
            AppError::StorageUnavailable(format!(
                "Failed to open store lock '{}': {}",
                lock_path.display(),
                err
            ))
        })?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(OwnerLockGuard { file, lock_path }),
        Err(err)
            if matches!(
                err.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::PermissionDenied
            ) || err.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
        {
            Err(AppError::StorageUnavailable(format!(
                "Store '{}' is already owned by another Wastebin process",
                root.display()
            )))
        }
        Err(err) => Err(AppError::StorageUnavailable(format!(
            "Failed to acquire store lock '{}': {}",
            lock_path.display(),
            err
        ))),
    }
}
