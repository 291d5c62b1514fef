//! Tessera Core Library
//!
//! Shared building blocks for the chunked upload pipeline: configuration, error types,
//! the chunk codec, filename sanitization and the wire-level response protocol.
//! Both the server (`tessera-api`) and the client (`tessera-api-client`) depend on it.

pub mod codec;
pub mod config;
pub mod error;
pub mod mime;
pub mod protocol;
pub mod sanitize;

// Re-export commonly used types
pub use codec::{chunk_digest, Chunk, ChunkLayout, ChunkRange, ChunkReader, CodecError};
pub use config::{Config, UploadConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use protocol::{ChunkAccepted, ErrorBody, FileAssembled, UploadResponse};
pub use sanitize::sanitize_and_unique;
