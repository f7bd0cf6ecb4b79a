//! Engine error taxonomy shared by every storage backend.
use thiserror::Error;

/// Errors returned by the paste store facade.
///
/// Backend-specific failures are normalized into these variants by the `From`
/// impls below, so callers never match on redb, SQLite or I/O types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Invalid paste name: {0}")]
    InvalidName(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Name index inconsistent with disk: {0}")]
    IndexInconsistency(String),
}

impl AppError {
    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::StorageUnavailable(format!("I/O error: {}", value))
    }
}

impl From<walkdir::Error> for AppError {
    fn from(value: walkdir::Error) -> Self {
        Self::StorageUnavailable(format!("Directory scan failed: {}", value))
    }
}

impl From<redb::Error> for AppError {
    fn from(value: redb::Error) -> Self {
        Self::StorageUnavailable(format!("Database error: {}", value))
    }
}

impl From<redb::DatabaseError> for AppError {
    fn from(value: redb::DatabaseError) -> Self {
        redb::Error::from(value).into()
    }
}

impl From<redb::TransactionError> for AppError {
    fn from(value: redb::TransactionError) -> Self {
        redb::Error::from(value).into()
    }
}

impl From<redb::TableError> for AppError {
    fn from(value: redb::TableError) -> Self {
        redb::Error::from(value).into()
    }
}

impl From<redb::StorageError> for AppError {
    fn from(value: redb::StorageError) -> Self {
        redb::Error::from(value).into()
    }
}

impl From<redb::CommitError> for AppError {
    fn from(value: redb::CommitError) -> Self {
        redb::Error::from(value).into()
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(ref failure, _)
                if matches!(
                    failure.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Self::Conflict(value.to_string())
            }
            other => Self::StorageUnavailable(format!("SQL error: {}", other)),
        }
    }
}
