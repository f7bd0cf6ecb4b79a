//! Configuration loading from environment variables and storage selection.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_BIND_HOST, DEFAULT_DATA_PATH, DEFAULT_MAX_PASTE_SIZE, DEFAULT_PORT, DEFAULT_WORKERS,
    REDB_FILE_NAME,
};
use crate::error::AppError;

/// Which engine serves a bare filesystem path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Sharded flat files plus an in-memory name index.
    #[default]
    Files,
    /// Transactional ordered tree (redb locally, SQL by URI).
    Tree,
}

impl BackendKind {
    /// Parse a backend name (`files` / `tree`, case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "files" | "file" | "flat" => Some(Self::Files),
            "tree" => Some(Self::Tree),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Files => f.write_str("files"),
            Self::Tree => f.write_str("tree"),
        }
    }
}

/// Resolved storage location, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// Flat-file store rooted at a directory.
    Files { root: PathBuf },
    /// Tree store over a local redb file.
    LocalTree { path: PathBuf },
    /// Tree store over SQLite (`sqlite://<path>` or `sqlite://:memory:`).
    Sqlite { location: String },
}

impl StorageTarget {
    /// Apply the storage selection policy to a location string.
    ///
    /// `scheme://...` always selects the relational tree adapter; a bare path
    /// selects by `backend`.
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] for unknown schemes, empty
    /// locations, or a URI combined with the flat-file backend.
    pub fn resolve(data: &str, backend: BackendKind) -> Result<Self, AppError> {
        let data = data.trim();
        if data.is_empty() {
            return Err(AppError::StorageUnavailable(
                "Storage location is empty".to_string(),
            ));
        }

        if let Some((scheme, rest)) = data.split_once("://") {
            if backend == BackendKind::Files {
                return Err(AppError::StorageUnavailable(format!(
                    "Storage URI '{}' requires the tree backend",
                    data
                )));
            }
            return match scheme.to_ascii_lowercase().as_str() {
                "sqlite" if !rest.is_empty() => Ok(Self::Sqlite {
                    location: rest.to_string(),
                }),
                "sqlite" => Err(AppError::StorageUnavailable(
                    "sqlite:// URI is missing a database path".to_string(),
                )),
                other => Err(AppError::StorageUnavailable(format!(
                    "Unsupported storage scheme '{}'",
                    other
                ))),
            };
        }

        let path = PathBuf::from(expand_tilde(data.to_string()));
        Ok(match backend {
            BackendKind::Files => Self::Files { root: path },
            BackendKind::Tree => Self::LocalTree {
                path: path.join(REDB_FILE_NAME),
            },
        })
    }
}

impl fmt::Display for StorageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Files { root } => write!(f, "flat files at {}", root.display()),
            Self::LocalTree { path } => write!(f, "redb tree at {}", path.display()),
            Self::Sqlite { location } => write!(f, "sqlite tree at {}", location),
        }
    }
}

/// Runtime configuration for Wastebin.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: String,
    #[serde(default)]
    pub backend: BackendKind,
    pub port: u16,
    pub bind_host: String,
    pub workers: usize,
    pub max_paste_size: usize,
    #[serde(default)]
    pub background_index: bool,
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DEFAULT_DATA_PATH.to_string(),
            backend: BackendKind::default(),
            port: DEFAULT_PORT,
            bind_host: DEFAULT_BIND_HOST.to_string(),
            workers: DEFAULT_WORKERS,
            max_paste_size: DEFAULT_MAX_PASTE_SIZE,
            background_index: false,
            debug: false,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = env::var_os("HOME").filter(|home| !home.is_empty()) {
            return PathBuf::from(home).join(rest).to_string_lossy().to_string();
        }
    }
    path
}

/// Parse a boolean-like flag value.
///
/// Truthy: `1`, `true`, `yes`, `on`. Falsy: `0`, `false`, `no`, `off`, empty.
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Missing or unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str| {
            lookup(key)
                .and_then(|value| parse_env_flag(&value))
                .unwrap_or(false)
        };

        Self {
            data: lookup("DATA")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.data),
            backend: lookup("BACKEND")
                .and_then(|value| BackendKind::parse(&value))
                .unwrap_or(defaults.backend),
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            bind_host: lookup("BIND_HOST")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.bind_host),
            workers: lookup("WORKERS")
                .and_then(|w| w.trim().parse().ok())
                .filter(|w| *w > 0)
                .unwrap_or(defaults.workers),
            max_paste_size: lookup("MAX_PASTE_SIZE")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.max_paste_size),
            background_index: flag("BACKGROUND_INDEX"),
            debug: flag("DEBUG"),
        }
    }

    /// Resolve [`Config::data`] and [`Config::backend`] into a storage target.
    ///
    /// # Errors
    /// See [`StorageTarget::resolve`].
    pub fn storage_target(&self) -> Result<StorageTarget, AppError> {
        StorageTarget::resolve(&self.data, self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_env_flag_accepts_truthy_and_falsy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
        for value in ["", "0", "false", " no ", "OFF"] {
            assert_eq!(parse_env_flag(value), Some(false), "value: {}", value);
        }
        assert_eq!(parse_env_flag("maybe"), None);
    }

    #[test]
    fn from_lookup_applies_defaults_when_empty() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.data, DEFAULT_DATA_PATH);
        assert_eq!(config.backend, BackendKind::Files);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert!(!config.debug);
        assert!(!config.background_index);
    }

    #[test]
    fn from_lookup_reads_overrides_and_ignores_garbage() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATA", "/srv/pastes"),
            ("BACKEND", "Tree"),
            ("PORT", "9000"),
            ("WORKERS", "0"),
            ("DEBUG", "yes"),
            ("BACKGROUND_INDEX", "nope"),
        ]));
        assert_eq!(config.data, "/srv/pastes");
        assert_eq!(config.backend, BackendKind::Tree);
        assert_eq!(config.port, 9000);
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert!(config.debug);
        assert!(!config.background_index);
    }

    #[test]
    fn bare_path_selects_backend_by_kind() {
        assert_eq!(
            StorageTarget::resolve("/srv/pastes", BackendKind::Files).unwrap(),
            StorageTarget::Files {
                root: PathBuf::from("/srv/pastes")
            }
        );
        assert_eq!(
            StorageTarget::resolve("/srv/pastes", BackendKind::Tree).unwrap(),
            StorageTarget::LocalTree {
                path: PathBuf::from("/srv/pastes").join(REDB_FILE_NAME)
            }
        );
    }

    #[test]
    fn uri_selects_relational_tree_adapter() {
        assert_eq!(
            StorageTarget::resolve("sqlite:///var/lib/wastebin.db", BackendKind::Tree).unwrap(),
            StorageTarget::Sqlite {
                location: "/var/lib/wastebin.db".to_string()
            }
        );
        assert_eq!(
            StorageTarget::resolve("sqlite://:memory:", BackendKind::Tree).unwrap(),
            StorageTarget::Sqlite {
                location: ":memory:".to_string()
            }
        );
    }

    #[test]
    fn invalid_storage_locations_are_rejected() {
        let cases = [
            ("postgres://db/pastes", BackendKind::Tree),
            ("sqlite://", BackendKind::Tree),
            ("sqlite:///x.db", BackendKind::Files),
            ("   ", BackendKind::Files),
        ];
        for (data, backend) in cases {
            assert!(
                matches!(
                    StorageTarget::resolve(data, backend),
                    Err(AppError::StorageUnavailable(_))
                ),
                "data: {:?} backend: {}",
                data,
                backend
            );
        }
    }
}
