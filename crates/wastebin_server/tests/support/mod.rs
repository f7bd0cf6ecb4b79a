//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use tempfile::TempDir;
use wastebin_server::{create_app, AppState, BackendKind, Config, Database};

pub(crate) fn test_config(data: String, backend: BackendKind) -> Config {
    Config {
        port: 0,
        data,
        backend,
        max_paste_size: 64 * 1024,
        ..Config::default()
    }
}

pub(crate) fn test_server_for_config(config: Config) -> TestServer {
    let db = Database::open(&config).expect("open db");
    let state = AppState::new(config, db);
    TestServer::new(create_app(state)).expect("server")
}

/// One server per backend variant, each over its own temp directory.
pub(crate) fn each_backend_server() -> Vec<(&'static str, TestServer, TempDir)> {
    ["files", "redb", "sqlite"]
        .into_iter()
        .map(|label| {
            let temp_dir = TempDir::new().expect("temp dir");
            let root = temp_dir.path().join("data");
            let config = match label {
                "files" => test_config(root.to_string_lossy().to_string(), BackendKind::Files),
                "redb" => test_config(root.to_string_lossy().to_string(), BackendKind::Tree),
                _ => test_config(
                    format!("sqlite://{}", temp_dir.path().join("pastes.db").display()),
                    BackendKind::Tree,
                ),
            };
            (label, test_server_for_config(config), temp_dir)
        })
        .collect()
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config(
        temp_dir.path().join("data").to_string_lossy().to_string(),
        BackendKind::Files,
    );
    (test_server_for_config(config), temp_dir)
}
