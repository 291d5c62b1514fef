//! Chunk store abstraction trait
//!
//! The receiver infers each upload's state from what the store holds rather than from a
//! session table, so the store exposes both mutations and state queries.

use crate::assembler::AssemblyReport;
use crate::keys::UploadId;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Directory error: {0}")]
    DirectoryError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte stream of an assembled artifact
pub type ArtifactStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Idempotently create the final and temporary roots.
    async fn ensure_root_directories(&self) -> StorageResult<()>;

    /// Idempotently create the per-upload temporary directory.
    async fn ensure_upload_dir(&self, upload_id: &UploadId) -> StorageResult<()>;

    /// Persist a chunk, replacing any previous bytes stored at that index.
    async fn write_chunk(&self, upload_id: &UploadId, index: u32, data: &[u8])
        -> StorageResult<()>;

    /// Remove a chunk. Missing chunks are not an error.
    async fn remove_chunk(&self, upload_id: &UploadId, index: u32) -> StorageResult<()>;

    async fn has_chunk(&self, upload_id: &UploadId, index: u32) -> StorageResult<bool>;

    /// Number of chunks currently stored for the upload (0 if it has no directory).
    async fn chunk_count(&self, upload_id: &UploadId) -> StorageResult<u32>;

    /// Concatenate chunks `0..total_chunks` into the artifact `final_name`.
    async fn assemble(
        &self,
        upload_id: &UploadId,
        total_chunks: u32,
        final_name: &str,
    ) -> AssemblyReport;

    /// Open an assembled artifact for streaming. Returns the stream and its length.
    async fn open_artifact(&self, name: &str) -> StorageResult<(ArtifactStream, u64)>;

    /// Verify the backend is usable.
    async fn check_health(&self) -> StorageResult<()>;

    /// Get the backend type
    fn backend_type(&self) -> &'static str;
}
