//! Core engine for Wastebin: paste storage backends, naming rules and config.

/// Content addressing for the flat-file backend.
pub mod addressing;
/// Configuration loading and storage selection.
pub mod config;
/// Shared constants.
pub mod constants;
/// Storage engine: flat-file and transactional tree backends behind one facade.
pub mod db;
/// Engine error taxonomy.
pub mod error;
/// Paste name validation.
pub mod naming;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{BackendKind, Config, StorageTarget};
pub use constants::*;
pub use db::{Database, PasteStore};
pub use error::AppError;
