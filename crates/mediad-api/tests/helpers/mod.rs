//! Test helpers: build the router against an isolated storage root.
//!
//! Run from workspace root: `cargo test -p mediad-api`.

pub mod fixtures;

use axum_test::TestServer;
use mediad_api::setup::routes;
use mediad_api::state::AppState;
use mediad_core::Config;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Test application: server, state, and the owned storage root.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn storage_root(&self) -> &std::path::Path {
        &self.state.config.storage_root
    }

    pub fn files_in(&self, dir: &str) -> Vec<String> {
        let path = self.storage_root().join(dir);
        let mut names: Vec<String> = std::fs::read_dir(&path)
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Setup a test app with default configuration and isolated storage.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup a test app with the configuration tweaked before startup.
pub async fn setup_test_app_with<F: FnOnce(&mut Config)>(tweak: F) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let mut config = Config {
        storage_root: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    tweak(&mut config);

    let state = Arc::new(
        AppState::from_config(config)
            .await
            .expect("Failed to build app state"),
    );
    let router =
        routes::setup_routes(&state.config, state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

/// A fresh principal id for a test request.
pub fn test_principal() -> Uuid {
    Uuid::new_v4()
}

pub const PRINCIPAL_HEADER: &str = "x-principal-id";
pub const ROLE_HEADER: &str = "x-principal-role";
