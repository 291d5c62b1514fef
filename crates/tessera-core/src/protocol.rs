//! Wire protocol for chunked uploads: header names and typed response bodies.

use serde::{Deserialize, Serialize};

/// Upload endpoint path
pub const UPLOAD_ROUTE: &str = "/api/upload";
/// Public path prefix under which assembled artifacts are served
pub const ARTIFACT_PREFIX: &str = "/uploads";

/// Multipart field carrying the chunk bytes
pub const CHUNK_FIELD: &str = "chunk";

pub const HEADER_UPLOAD_ID: &str = "x-upload-id";
pub const HEADER_CHUNK_INDEX: &str = "x-chunk-index";
pub const HEADER_TOTAL_CHUNKS: &str = "x-total-chunks";
pub const HEADER_ORIGINAL_FILENAME: &str = "x-original-filename";
pub const HEADER_FILE_TYPE: &str = "x-file-type";
pub const HEADER_FILE_SIZE: &str = "x-file-size";
pub const HEADER_CHUNK_HASH: &str = "x-chunk-hash";

/// Value of `serverData.uploadedBy` in assembled-file responses
pub const UPLOADED_BY: &str = "api-route";

/// Public URL path of an assembled artifact.
pub fn artifact_path(filename: &str) -> String {
    format!("{}/{}", ARTIFACT_PREFIX, filename)
}

/// Response to every upload request, discriminated by `responseType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "responseType")]
pub enum UploadResponse {
    #[serde(rename = "chunkSuccess")]
    ChunkSuccess(ChunkAccepted),
    #[serde(rename = "fileSuccess")]
    FileSuccess(FileAssembled),
    #[serde(rename = "error")]
    Error(ErrorBody),
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        match self {
            UploadResponse::ChunkSuccess(body) => body.success,
            UploadResponse::FileSuccess(body) => body.success,
            UploadResponse::Error(_) => false,
        }
    }
}

/// An intermediate chunk was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkAccepted {
    pub success: bool,
    pub message: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
}

impl ChunkAccepted {
    pub fn new(chunk_index: u32, total_chunks: u32) -> Self {
        Self {
            success: true,
            message: format!(
                "Chunk {}/{} uploaded successfully",
                chunk_index + 1,
                total_chunks
            ),
            chunk_index,
            total_chunks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerData {
    pub uploaded_by: String,
}

/// The last chunk was stored and the file assembled.
///
/// `fileUrl`, `path` and `url` carry the same relative URL; `ufsUrl` is its absolute form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAssembled {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub file_url: String,
    pub file_name: String,
    pub path: String,
    pub url: String,
    pub server_data: ServerData,
    pub custom_id: String,
    pub app_url: String,
    pub ufs_url: String,
    pub file_hash: String,
}

impl FileAssembled {
    pub fn new(filename: String, upload_id: String, app_url: &str, file_hash: String) -> Self {
        let relative = artifact_path(&filename);
        let app_url = app_url.trim_end_matches('/').to_string();
        Self {
            success: true,
            message: "File uploaded and assembled successfully".to_string(),
            file_url: relative.clone(),
            file_name: filename.clone(),
            path: relative.clone(),
            url: relative.clone(),
            server_data: ServerData {
                uploaded_by: UPLOADED_BY.to_string(),
            },
            custom_id: upload_id,
            ufs_url: format!("{}{}", app_url, relative),
            app_url,
            file_hash,
            filename,
        }
    }
}

/// Terminal failure for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Machine-readable error code for programmatic handling
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub status: u16,
    /// Whether resending the same request may succeed
    #[serde(default)]
    pub recoverable: bool,
    #[serde(
        default,
        rename = "suggestedAction",
        skip_serializing_if = "Option::is_none"
    )]
    pub suggested_action: Option<String>,
}
