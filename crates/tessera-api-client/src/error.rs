use tessera_core::CodecError;
use thiserror::Error;

/// Failure of a chunked upload. Variants raised mid-upload carry enough to resume it.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Chunk {chunk_index} of upload {upload_id} rejected with status {status}: {error}")]
    ChunkRejected {
        upload_id: String,
        chunk_index: u32,
        status: u16,
        error: String,
        details: Option<String>,
        code: String,
        suggested_action: Option<String>,
    },

    #[error("Request for chunk {chunk_index} of upload {upload_id} failed: {source}")]
    Http {
        upload_id: String,
        chunk_index: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response for chunk {chunk_index} of upload {upload_id}: {message}")]
    UnexpectedResponse {
        upload_id: String,
        chunk_index: u32,
        message: String,
    },

    #[error("Upload {upload_id} cancelled before chunk {next_chunk}")]
    Cancelled { upload_id: String, next_chunk: u32 },

    #[error("Start index {start} is out of range for {total_chunks} chunks")]
    InvalidStartIndex { start: u32, total_chunks: u32 },

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("Failed to read file: {0}")]
    Codec(#[from] CodecError),
}

impl TransportError {
    /// Upload ID and chunk index to pass back as `UploadOptions` to resume this upload.
    pub fn resume_point(&self) -> Option<(&str, u32)> {
        match self {
            TransportError::ChunkRejected {
                upload_id,
                chunk_index,
                ..
            }
            | TransportError::Http {
                upload_id,
                chunk_index,
                ..
            }
            | TransportError::UnexpectedResponse {
                upload_id,
                chunk_index,
                ..
            } => Some((upload_id, *chunk_index)),
            TransportError::Cancelled {
                upload_id,
                next_chunk,
            } => Some((upload_id, *next_chunk)),
            TransportError::InvalidStartIndex { .. }
            | TransportError::InvalidHeader(_)
            | TransportError::Codec(_) => None,
        }
    }

    /// HTTP status of a rejected chunk
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::ChunkRejected { status, .. } => Some(*status),
            TransportError::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_point() {
        let err = TransportError::ChunkRejected {
            upload_id: "u1".to_string(),
            chunk_index: 3,
            status: 500,
            error: "Error processing chunk".to_string(),
            details: None,
            code: "CHUNK_WRITE_FAILED".to_string(),
            suggested_action: Some("Retry the chunk after a short delay".to_string()),
        };
        assert_eq!(err.resume_point(), Some(("u1", 3)));
        assert_eq!(err.status(), Some(500));

        let err = TransportError::Cancelled {
            upload_id: "u2".to_string(),
            next_chunk: 5,
        };
        assert_eq!(err.resume_point(), Some(("u2", 5)));

        let err = TransportError::InvalidStartIndex {
            start: 9,
            total_chunks: 2,
        };
        assert_eq!(err.resume_point(), None);
    }
}
