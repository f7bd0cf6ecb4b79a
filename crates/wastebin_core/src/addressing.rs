//! Name-to-path addressing for the flat-file backend.
//!
//! The digest is a SHA-256 of the paste *name*, never of its content, so two
//! pastes with identical bodies still occupy two files.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::constants::RECORD_EXTENSION;

/// Length in hex characters of every address.
pub const ADDRESS_LEN: usize = 64;

/// Hex-encoded SHA-256 of the UTF-8 bytes of `name`.
pub fn address_of(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hex::encode(hasher.finalize())
}

/// Two-level shard directory for an address: `<root>/<hex[0]>/<hex[1]>`.
pub fn shard_dir(root: &Path, address: &str) -> PathBuf {
    root.join(&address[0..1]).join(&address[1..2])
}

/// Final record path for an address: `<root>/<hex[0]>/<hex[1]>/<hex>.txt`.
pub fn record_path(root: &Path, address: &str) -> PathBuf {
    shard_dir(root, address).join(format!("{}.{}", address, RECORD_EXTENSION))
}

/// Record path for a paste name.
pub fn path_for_name(root: &Path, name: &str) -> PathBuf {
    record_path(root, &address_of(name))
}
