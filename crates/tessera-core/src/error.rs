//! Error types module
//!
//! All upload pipeline failures are unified under the `AppError` enum. Each variant
//! self-describes how it is presented to clients through the `ErrorMetadata` trait,
//! so the HTTP layer only has to render it.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like integrity mismatches
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Short client-facing message, sent as the `error` field
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing chunked upload headers")]
    MissingChunkHeaders,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No chunk data uploaded")]
    MissingChunkData,

    #[error("File too large: {details}")]
    FileTooLarge { file: String, details: String },

    #[error("Chunk too large: {size} bytes exceeds {max} bytes")]
    ChunkTooLarge { size: usize, max: usize },

    /// Rejected by the server-wide body limit before the chunk was parsed
    #[error("Request body exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    #[error("Unsupported file type: {details}")]
    UnsupportedFileType { file: String, details: String },

    #[error("Chunk {chunk_index} failed integrity check")]
    IntegrityMismatch { chunk_index: u32 },

    #[error("Failed to store chunk: {0}")]
    ChunkWrite(String),

    #[error("Assembly failed: {0}")]
    AssemblyFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant:
/// (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::MissingChunkHeaders => (
            501,
            "CHUNK_HEADERS_MISSING",
            false,
            Some("Send the file in chunks with X-Upload-ID and related headers"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request headers and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::MissingChunkData => (
            400,
            "CHUNK_DATA_MISSING",
            false,
            Some("Send the chunk bytes in the 'chunk' multipart field"),
            false,
            LogLevel::Debug,
        ),
        AppError::FileTooLarge { .. } => (
            413,
            "FILE_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::ChunkTooLarge { .. } => (
            413,
            "CHUNK_TOO_LARGE",
            false,
            Some("Use a smaller chunk size"),
            false,
            LogLevel::Debug,
        ),
        AppError::RequestTooLarge { .. } => (
            413,
            "REQUEST_TOO_LARGE",
            false,
            Some("Use a smaller chunk size"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedFileType { .. } => (
            415,
            "UNSUPPORTED_FILE_TYPE",
            false,
            Some("Upload one of the allowed file types"),
            false,
            LogLevel::Debug,
        ),
        AppError::IntegrityMismatch { .. } => (
            400,
            "CHUNK_INTEGRITY_FAILED",
            true,
            Some("Resend the chunk"),
            false,
            LogLevel::Warn,
        ),
        AppError::ChunkWrite(_) => (
            500,
            "CHUNK_WRITE_FAILED",
            true,
            Some("Retry the chunk after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::AssemblyFailed(_) => (
            500,
            "ASSEMBLY_FAILED",
            true,
            Some("Upload the file again"),
            false,
            LogLevel::Error,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check API key"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the file name"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::MissingChunkHeaders => "MissingChunkHeaders",
            AppError::BadRequest(_) => "BadRequest",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::MissingChunkData => "MissingChunkData",
            AppError::FileTooLarge { .. } => "FileTooLarge",
            AppError::ChunkTooLarge { .. } => "ChunkTooLarge",
            AppError::RequestTooLarge { .. } => "RequestTooLarge",
            AppError::UnsupportedFileType { .. } => "UnsupportedFileType",
            AppError::IntegrityMismatch { .. } => "IntegrityMismatch",
            AppError::ChunkWrite(_) => "ChunkWrite",
            AppError::AssemblyFailed(_) => "AssemblyFailed",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Human-readable details sent alongside `error`, if any
    pub fn details(&self) -> Option<String> {
        match self {
            AppError::BadRequest(msg) => Some(msg.clone()),
            AppError::FileTooLarge { details, .. } => Some(details.clone()),
            AppError::UnsupportedFileType { details, .. } => Some(details.clone()),
            AppError::ChunkTooLarge { size, max } => Some(format!(
                "Chunk of {} bytes exceeds the maximum chunk size of {} bytes",
                size, max
            )),
            AppError::RequestTooLarge { limit } => Some(format!(
                "Request body exceeds the limit of {} bytes",
                limit
            )),
            AppError::IntegrityMismatch { chunk_index } => Some(format!(
                "SHA-256 of chunk {} does not match X-Chunk-Hash",
                chunk_index
            )),
            AppError::ChunkWrite(msg) => Some(msg.clone()),
            AppError::AssemblyFailed(_) => {
                Some("One or more chunks could not be processed".to_string())
            }
            AppError::Internal(msg) => Some(msg.clone()),
            AppError::InternalWithSource { .. } => Some(self.detailed_message()),
            AppError::MissingChunkHeaders
            | AppError::InvalidInput(_)
            | AppError::MissingChunkData
            | AppError::Unauthorized(_)
            | AppError::NotFound(_) => None,
        }
    }

    /// Original file name the error refers to (validation errors only)
    pub fn file(&self) -> Option<&str> {
        match self {
            AppError::FileTooLarge { file, .. } | AppError::UnsupportedFileType { file, .. } => {
                Some(file)
            }
            _ => None,
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = match self {
            AppError::InternalWithSource { message, .. } => message.clone(),
            _ => self.to_string(),
        };

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MissingChunkHeaders => {
                "Single file upload not implemented in this version".to_string()
            }
            AppError::BadRequest(_) => "Invalid upload request".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::MissingChunkData => "No chunk data uploaded".to_string(),
            AppError::FileTooLarge { .. } => "File too large".to_string(),
            AppError::ChunkTooLarge { .. } => "Chunk too large".to_string(),
            AppError::RequestTooLarge { .. } => "Request too large".to_string(),
            AppError::UnsupportedFileType { .. } => "Unsupported file type".to_string(),
            AppError::IntegrityMismatch { .. } => "Chunk integrity check failed".to_string(),
            AppError::ChunkWrite(_) => "Error processing chunk".to_string(),
            AppError::AssemblyFailed(_) => "Failed to assemble file chunks".to_string(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
