//! Sharded flat-file blob storage.

use super::record::{decode_name, decode_record, encode_record};
use crate::addressing::{address_of, record_path, shard_dir};
use crate::constants::{RECORD_EXTENSION, TEMP_EXTENSION};
use crate::error::AppError;
use crate::naming::is_valid_name;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Raw file operations over `<root>/<hex[0]>/<hex[1]>/<hex>.txt`.
///
/// Knows nothing about the name index; [`super::FileDb`] keeps the two in step.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

fn not_found_or<T>(result: io::Result<T>) -> Result<T, AppError> {
    result.map_err(|err| match err.kind() {
        ErrorKind::NotFound => AppError::NotFound,
        _ => err.into(),
    })
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path of the record for `name`.
    pub fn path_of(&self, name: &str) -> PathBuf {
        record_path(&self.root, &address_of(name))
    }

    /// Persist `content` under `name`, replacing any previous record.
    ///
    /// The record is written to a temporary file in the shard directory and
    /// renamed into place, so readers see either the old or the new record.
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] when the tree is not writable.
    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf, AppError> {
        let address = address_of(name);
        let dir = shard_dir(&self.root, &address);
        let path = record_path(&self.root, &address);
        let bytes = encode_record(name, content)?;

        // A concurrent delete may prune the shard between mkdir and write.
        let mut attempts_left = 2;
        loop {
            attempts_left -= 1;
            fs::create_dir_all(&dir)?;
            match self.write_replace(&dir, &address, &path, &bytes) {
                Ok(()) => return Ok(path),
                Err(err) if err.kind() == ErrorKind::NotFound && attempts_left > 0 => {
                    tracing::debug!("Shard {:?} vanished during write, retrying", dir);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn write_replace(&self, dir: &Path, address: &str, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let tmp_path = dir.join(format!(
            ".{}.{}.{}",
            address,
            uuid::Uuid::new_v4().simple(),
            TEMP_EXTENSION
        ));
        let result = (|| {
            let mut file = File::create(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp_path, path)
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    /// Load the content stored under `name`.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when no record exists, or
    /// [`AppError::StorageUnavailable`] when the record is unreadable or
    /// belongs to a different name.
    pub fn read(&self, name: &str) -> Result<String, AppError> {
        let path = self.path_of(name);
        let bytes = not_found_or(fs::read(&path))?;
        let (stored_name, content) = decode_record(&bytes)?;
        if stored_name != name {
            return Err(AppError::StorageUnavailable(format!(
                "Record {:?} holds '{}' instead of '{}'",
                path, stored_name, name
            )));
        }
        Ok(content)
    }

    /// Whether a record exists for `name`.
    pub fn exists(&self, name: &str) -> io::Result<bool> {
        self.path_of(name).try_exists()
    }

    /// Remove the record for `name`, then prune empty shard directories.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when no record exists. The raw
    /// [`io::Error`] is preserved in other cases so callers can decide how to
    /// reconcile their index.
    pub fn remove(&self, name: &str) -> Result<(), RemoveError> {
        let path = self.path_of(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(RemoveError::NotFound),
            Err(err) => return Err(RemoveError::Io(err)),
        }
        self.prune_shards(&path).map_err(RemoveError::Cleanup)
    }

    fn prune_shards(&self, record: &Path) -> io::Result<()> {
        let mut dir = record.parent();
        for _ in 0..2 {
            let Some(current) = dir else {
                break;
            };
            if current == self.root {
                break;
            }
            match fs::remove_dir(current) {
                Ok(()) => {}
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::DirectoryNotEmpty | ErrorKind::NotFound
                    ) =>
                {
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
            dir = current.parent();
        }
        Ok(())
    }

    /// Walk the whole tree once and return `(name, path)` for every record.
    ///
    /// Only `*.txt` files are considered. Records whose first line is not a
    /// valid name, or whose path does not match the address of that name, are
    /// skipped with a warning. Cost is O(total files); startup use only.
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] when the root itself cannot be
    /// read; unreadable subdirectories are skipped with a warning.
    pub fn scan(&self) -> Result<Vec<(String, PathBuf)>, AppError> {
        let mut found = Vec::new();
        if !self.root.try_exists()? {
            return Ok(found);
        }

        for entry in WalkDir::new(&self.root).min_depth(3).max_depth(3) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(err.into()),
                Err(err) => {
                    tracing::warn!("Skipping unreadable path under {:?}: {}", self.root, err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }

            let name = match read_first_line(path) {
                Ok(Some(name)) => name,
                Ok(None) => {
                    tracing::warn!("Skipping record {:?}: first line is not UTF-8", path);
                    continue;
                }
                Err(err) => {
                    tracing::warn!("Skipping unreadable record {:?}: {}", path, err);
                    continue;
                }
            };
            if !is_valid_name(&name) {
                tracing::warn!("Skipping record {:?}: invalid name {:?}", path, name);
                continue;
            }
            if self.path_of(&name) != path {
                tracing::warn!(
                    "Skipping record {:?}: stored name '{}' addresses elsewhere",
                    path,
                    name
                );
                continue;
            }
            found.push((name, path.to_path_buf()));
        }

        tracing::debug!("Scanned {} record(s) under {:?}", found.len(), self.root);
        Ok(found)
    }
}

fn read_first_line(path: &Path) -> io::Result<Option<String>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line)?;
    Ok(decode_name(&line))
}

/// Failure modes of [`FileStore::remove`].
#[derive(Debug)]
pub enum RemoveError {
    /// No record existed.
    NotFound,
    /// The record could not be removed.
    Io(io::Error),
    /// The record is gone but shard cleanup failed.
    Cleanup(io::Error),
}
