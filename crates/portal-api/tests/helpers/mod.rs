//! Test helpers: build AppState and router for integration tests.
//!
//! The router is the production one from `setup::routes`; only persistence
//! (in-memory repository) and storage (temp dir) are swapped out, so no
//! database or Docker is needed. Run with `cargo test -p portal-api`.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::TestServer;
use portal_api::setup::{routes, services};
use portal_core::{Config, RateLimitSettings, UploadSettings};
use portal_db::InMemorySubmissionRepository;
use portal_storage::{LocalStorage, Storage};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_SALT: &str = "integration-test-salt-0123456789";

/// Test application: server plus the backends it was built over.
pub struct TestApp {
    pub server: TestServer,
    pub repository: InMemorySubmissionRepository,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Names of complete files in the upload root (temp files excluded).
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_dir.path())
            .expect("Failed to read upload dir")
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        names
    }

    pub fn stored_file_path(&self, name: &str) -> std::path::PathBuf {
        self.upload_dir.path().join(name)
    }
}

pub fn create_test_config(upload_dir: &Path) -> Config {
    Config {
        environment: "test".to_string(),
        rate_limit: RateLimitSettings {
            window_seconds: 60,
            max_requests: 10,
            ..RateLimitSettings::default()
        },
        upload: UploadSettings {
            max_upload_bytes: 1024 * 1024,
            upload_dir: upload_dir.to_string_lossy().into_owned(),
            public_base_url: "http://localhost:4000/uploads".to_string(),
        },
        ip_hash_salt: TEST_SALT.to_string(),
        insecure_salt: false,
        ..Config::default()
    }
}

/// Setup test app with default test configuration.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup test app after letting the caller adjust the configuration.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let mut config = create_test_config(upload_dir.path());
    customize(&mut config);

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(upload_dir.path(), config.upload.public_base_url.clone())
            .await
            .expect("Failed to create local storage"),
    );
    let repository = InMemorySubmissionRepository::new();

    let state = services::initialize_services(&config, Arc::new(repository.clone()), storage)
        .expect("Failed to initialize services");
    let app = routes::setup_routes(&config, state)
        .await
        .expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        repository,
        upload_dir,
    }
}
