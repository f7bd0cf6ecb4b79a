//! Transactional ordered-tree backend over pluggable storage adapters.

/// Local redb adapter.
pub mod local;
/// SQLite adapter reached by URI.
pub mod relational;

pub use local::RedbAdapter;
pub use relational::SqliteAdapter;

use super::PasteStore;
use crate::error::AppError;

/// Low-level ordered key/value storage with one transaction per call.
///
/// Every method must be atomic on its own: a crash or a concurrent caller
/// observes either none or all of its effect.
pub trait TreeAdapter: Send + Sync {
    /// Short adapter label for logs.
    fn kind(&self) -> &'static str;

    /// Point lookup.
    fn get(&self, name: &str) -> Result<Option<String>, AppError>;

    /// Insert `name`, or replace its content if it already exists.
    fn upsert(&self, name: &str, content: &str) -> Result<(), AppError>;

    /// Remove `name`, returning whether it existed.
    fn remove(&self, name: &str) -> Result<bool, AppError>;

    /// Keys starting with `prefix` in ascending order, found by seeking to
    /// `prefix` and stopping at the first key that no longer matches.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError>;

    /// Release connections and flush pending state.
    fn close(self: Box<Self>) -> Result<(), AppError>;
}

/// Paste store backed by a [`TreeAdapter`].
pub struct TreeDb {
    adapter: Box<dyn TreeAdapter>,
}

impl TreeDb {
    pub fn new(adapter: Box<dyn TreeAdapter>) -> Self {
        Self { adapter }
    }

    pub fn kind(&self) -> &'static str {
        self.adapter.kind()
    }

    /// Close the underlying adapter.
    pub fn close(self) -> Result<(), AppError> {
        self.adapter.close()
    }
}

impl PasteStore for TreeDb {
    fn read(&self, name: &str) -> Result<String, AppError> {
        self.adapter.get(name)?.ok_or(AppError::NotFound)
    }

    fn write(&self, name: &str, content: &str) -> Result<(), AppError> {
        self.adapter.upsert(name, content)?;
        tracing::debug!("Committed paste '{}' to {} tree", name, self.kind());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), AppError> {
        if self.adapter.remove(name)? {
            tracing::debug!("Removed paste '{}' from {} tree", name, self.kind());
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        self.adapter.scan_prefix(prefix)
    }
}
