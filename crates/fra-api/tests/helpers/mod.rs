//! Test helpers: build AppState and router for integration tests, in memory or on a socket.
//!
//! Run from workspace root: `cargo test -p fra-api --test upload_test`.

pub mod fixtures;

use axum_test::TestServer;
use fra_api::setup::routes;
use fra_api::{AppState, LoggingAnalysisService};
use fra_core::{Config, IngestConfig};
use fra_storage::{LocalStorage, StagingArea, Storage};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// API path under the default prefix (e.g. `/api/v1/upload`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", fra_core::constants::api_prefix("v1"), path)
}

/// Test application: server plus the temporary storage root it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub storage_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Names of committed files in the storage root (the staging area is excluded).
    pub fn stored_files(&self) -> Vec<String> {
        list_files(&self.storage_root)
    }

    /// Names of files still sitting in the staging area.
    pub fn staged_files(&self) -> Vec<String> {
        list_files(&self.storage_root.join(".staging"))
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Setup test app with default limits and local storage in a temp directory.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup test app after adjusting the default configuration.
pub async fn setup_test_app_with(configure: impl FnOnce(&mut IngestConfig)) -> TestApp {
    let (router, storage_root, temp_dir) = build_router(configure).await;
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        storage_root,
        _temp_dir: temp_dir,
    }
}

/// App served on a real socket, for tests that need control over how the body arrives.
pub struct LiveApp {
    pub addr: SocketAddr,
    pub storage_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl LiveApp {
    pub fn stored_files(&self) -> Vec<String> {
        list_files(&self.storage_root)
    }

    pub fn staged_files(&self) -> Vec<String> {
        list_files(&self.storage_root.join(".staging"))
    }
}

/// Serve the app on `127.0.0.1:0` after adjusting the default configuration.
pub async fn spawn_live_app_with(configure: impl FnOnce(&mut IngestConfig)) -> LiveApp {
    let (router, storage_root, temp_dir) = build_router(configure).await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server error");
    });

    LiveApp {
        addr,
        storage_root,
        _temp_dir: temp_dir,
    }
}

async fn build_router(
    configure: impl FnOnce(&mut IngestConfig),
) -> (axum::Router, PathBuf, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_root = temp_dir.path().join("public");

    let mut ingest = IngestConfig {
        local_storage_path: storage_root.clone(),
        ..IngestConfig::default()
    };
    configure(&mut ingest);
    let config = Config::new(ingest);

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(&storage_root, "/public".to_string())
            .await
            .expect("Failed to create local storage"),
    );
    let staging = StagingArea::new(config.staging_path())
        .await
        .expect("Failed to create staging area");

    let state = Arc::new(AppState::new(
        config.clone(),
        storage,
        staging,
        Arc::new(LoggingAnalysisService),
    ));

    let router = routes::setup_routes(&config, state).expect("Failed to build routes");
    (router, storage_root, temp_dir)
}
