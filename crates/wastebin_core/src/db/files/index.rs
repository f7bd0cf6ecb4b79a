//! In-memory name index for the flat-file store.

use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Ordered set of every paste name known to be on disk.
///
/// Owned by one [`super::FileDb`]; request handlers reach it only through
/// that store. Every mutation is a single set operation, so a panic while the
/// lock is held cannot leave a half-applied change and poisoning is ignored.
#[derive(Debug, Default)]
pub struct NameIndex {
    names: RwLock<BTreeSet<String>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeSet<String>> {
        self.names.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeSet<String>> {
        self.names.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `name` as present.
    pub fn insert(&self, name: &str) {
        self.write().insert(name.to_string());
    }

    /// Forget `name`, returning whether it was indexed.
    pub fn remove(&self, name: &str) -> bool {
        self.write().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Add scanned names without dropping anything indexed meanwhile.
    pub fn merge<I>(&self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.write().extend(names);
    }

    /// Replace the whole index with `names`.
    pub fn replace<I>(&self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        let fresh: BTreeSet<String> = names.into_iter().collect();
        *self.write() = fresh;
    }

    /// Names starting with `prefix`, ascending. An empty prefix matches all.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.read()
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }
}
