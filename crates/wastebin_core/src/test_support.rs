//! Shared test-only helpers for wastebin_core.

use crate::config::StorageTarget;
use crate::constants::REDB_FILE_NAME;
use crate::Database;
use tempfile::TempDir;

/// Every backend variant, each over its own temp directory.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
pub(crate) fn each_backend() -> Vec<(&'static str, Database, TempDir)> {
    vec![
        {
            let (db, temp) = setup_files_db();
            ("files", db, temp)
        },
        {
            let (db, temp) = setup_redb_db();
            ("redb", db, temp)
        },
        {
            let (db, temp) = setup_sqlite_db();
            ("sqlite", db, temp)
        },
    ]
}

pub(crate) fn setup_files_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let target = StorageTarget::Files {
        root: temp_dir.path().join("pastes"),
    };
    let db = Database::open_target(&target, true).expect("files db");
    (db, temp_dir)
}

pub(crate) fn setup_redb_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let target = StorageTarget::LocalTree {
        path: temp_dir.path().join(REDB_FILE_NAME),
    };
    let db = Database::open_target(&target, true).expect("redb db");
    (db, temp_dir)
}

pub(crate) fn setup_sqlite_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let location = temp_dir.path().join("pastes.db");
    let target = StorageTarget::Sqlite {
        location: location.to_str().expect("utf-8 path").to_string(),
    };
    let db = Database::open_target(&target, true).expect("sqlite db");
    (db, temp_dir)
}
