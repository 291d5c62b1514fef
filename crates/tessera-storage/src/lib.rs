//! Tessera Storage Library
//!
//! Chunk persistence and assembly for the upload pipeline. The receiver talks to the
//! [`ChunkStore`] trait only, so the filesystem backend can be swapped without touching
//! its control flow.
//!
//! # On-disk layout
//!
//! - `{tmp_root}/{upload_id}/chunk-{index}.tmp` for in-flight chunks
//! - `{final_root}/{filename}` for assembled artifacts
//!
//! Upload IDs and artifact names are validated in the `keys` module before any path is built.

pub mod assembler;
pub mod dirs;
pub mod keys;
pub mod local;
pub mod reaper;
pub mod traits;

// Re-export commonly used types
pub use assembler::{AssemblyReport, CleanupWarning};
pub use dirs::UploadDirs;
pub use keys::UploadId;
pub use local::LocalChunkStore;
pub use reaper::{ReaperHandle, StaleUploadReaper};
pub use traits::{ArtifactStream, ChunkStore, StorageError, StorageResult};
