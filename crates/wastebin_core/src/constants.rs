//! Shared constants used across Wastebin crates.

/// Default HTTP port for the server.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind host for the server.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default storage location (current directory, flat-file backend).
pub const DEFAULT_DATA_PATH: &str = "./";

/// Default number of concurrently served requests.
pub const DEFAULT_WORKERS: usize = 5;

/// Default maximum request body accepted by the HTTP layer.
pub const DEFAULT_MAX_PASTE_SIZE: usize = 10 * 1024 * 1024;

/// Total attempts for an operation that keeps hitting write conflicts.
pub const MAX_CONFLICT_ATTEMPTS: u32 = 3;

/// Backoff unit between conflict retries, multiplied by the attempt number.
pub const CONFLICT_BACKOFF_MS: u64 = 10;

/// SQLite busy timeout before a lock wait is reported as a conflict.
pub const SQLITE_BUSY_TIMEOUT_MS: u64 = 250;

/// File name for the redb database inside a tree-backend data directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Owner lock held by the flat-file store for its lifetime.
pub const STORE_LOCK_FILE_NAME: &str = ".wastebin.lock";

/// Extension of paste record files in the flat-file store.
pub const RECORD_EXTENSION: &str = "txt";

/// Extension of in-flight temporary files in the flat-file store.
pub const TEMP_EXTENSION: &str = "tmp";

/// Default base URL for the `wpaste` client.
pub const DEFAULT_CLI_HOST: &str = "http://localhost:8080";
