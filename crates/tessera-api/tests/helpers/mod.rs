//! Test helpers: build AppState and router over a temporary upload root.
//!
//! Run from workspace root: `cargo test -p tessera-api`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tessera_api::setup::routes;
use tessera_api::state::AppState;
use tessera_core::protocol::{
    CHUNK_FIELD, HEADER_CHUNK_HASH, HEADER_CHUNK_INDEX, HEADER_FILE_SIZE, HEADER_FILE_TYPE,
    HEADER_ORIGINAL_FILENAME, HEADER_TOTAL_CHUNKS, HEADER_UPLOAD_ID, UPLOAD_ROUTE,
};
use tessera_core::{Config, UploadConfig};
use tessera_storage::LocalChunkStore;

pub const TEST_UPLOAD_API_KEY: &str = "test-upload-key-0123456789abcdef0123";

/// Test application: server and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub config: Config,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn final_dir(&self) -> PathBuf {
        self.config.final_dir().to_path_buf()
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.config.tmp_dir().to_path_buf()
    }

    pub fn upload_dir(&self, upload_id: &str) -> PathBuf {
        self.tmp_dir().join(upload_id)
    }

    pub fn chunk_path(&self, upload_id: &str, index: u32) -> PathBuf {
        self.upload_dir(upload_id).join(format!("chunk-{}.tmp", index))
    }
}

/// Setup test app with default limits.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup test app after adjusting the configuration.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut UploadConfig)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let mut upload_config = UploadConfig::with_root(temp_dir.path().join("uploads"));
    customize(&mut upload_config);
    let config: Config = upload_config.into();
    config.validate().expect("Invalid test configuration");

    let store = LocalChunkStore::new(config.final_dir(), config.tmp_dir())
        .await
        .expect("Failed to create local chunk store");
    let state = Arc::new(AppState::new(config.clone(), Arc::new(store)));

    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        config,
        _temp_dir: temp_dir,
    }
}

/// One chunk request as a client would send it.
#[derive(Debug, Clone)]
pub struct ChunkSpec<'a> {
    pub upload_id: &'a str,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub filename: &'a str,
    pub file_type: &'a str,
    pub file_size: u64,
    pub hash: Option<String>,
}

impl<'a> ChunkSpec<'a> {
    pub fn new(upload_id: &'a str, chunk_index: u32, total_chunks: u32, file_size: u64) -> Self {
        Self {
            upload_id,
            chunk_index,
            total_chunks,
            filename: "report.pdf",
            file_type: "application/pdf",
            file_size,
            hash: None,
        }
    }

    pub fn filename(mut self, filename: &'a str) -> Self {
        self.filename = filename;
        self
    }

    pub fn file_type(mut self, file_type: &'a str) -> Self {
        self.file_type = file_type;
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

pub fn chunk_form(data: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        CHUNK_FIELD,
        Part::bytes(data.to_vec())
            .file_name("blob")
            .mime_type("application/octet-stream"),
    )
}

/// POST one chunk to the upload route.
pub async fn send_chunk(server: &TestServer, spec: &ChunkSpec<'_>, data: &[u8]) -> TestResponse {
    let mut request = server
        .post(UPLOAD_ROUTE)
        .add_header(HEADER_UPLOAD_ID, spec.upload_id.to_string())
        .add_header(HEADER_CHUNK_INDEX, spec.chunk_index.to_string())
        .add_header(HEADER_TOTAL_CHUNKS, spec.total_chunks.to_string())
        .add_header(HEADER_ORIGINAL_FILENAME, spec.filename.to_string())
        .add_header(HEADER_FILE_TYPE, spec.file_type.to_string())
        .add_header(HEADER_FILE_SIZE, spec.file_size.to_string());
    if let Some(hash) = &spec.hash {
        request = request.add_header(HEADER_CHUNK_HASH, hash.clone());
    }
    request.multipart(chunk_form(data)).await
}

/// Deterministic test payload
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
