//! Engine tests run against every backend.

use super::*;
use crate::test_support::{each_backend, setup_files_db, setup_redb_db, setup_sqlite_db};
use std::sync::{Arc, Barrier};
use std::thread;

mod concurrency;
