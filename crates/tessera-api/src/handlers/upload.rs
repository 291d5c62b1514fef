//! Chunked upload receiver.
//!
//! One chunk per request. The upload's progress is never held in memory: the chunk files
//! present under the upload's temporary directory are its state, and the last chunk
//! triggers assembly into the final artifact.

use crate::error::HttpAppError;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header::HOST, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tessera_core::protocol::{
    CHUNK_FIELD, HEADER_CHUNK_HASH, HEADER_CHUNK_INDEX, HEADER_FILE_SIZE, HEADER_FILE_TYPE,
    HEADER_ORIGINAL_FILENAME, HEADER_TOTAL_CHUNKS, HEADER_UPLOAD_ID,
};
use tessera_core::{
    chunk_digest, mime, sanitize_and_unique, AppError, ChunkAccepted, Config, FileAssembled,
    UploadResponse,
};
use tessera_storage::{StorageError, UploadId};

/// Upper bound on chunks per upload
pub const MAX_CHUNK_COUNT: u32 = 10_000;

/// Chunk metadata carried in request headers
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub upload_id: UploadId,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub original_filename: String,
    pub file_type: String,
    pub file_size: u64,
    pub chunk_hash: Option<String>,
}

/// Header value as text. Non-ASCII bytes are decoded as UTF-8 so raw file names survive.
fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_number<T: std::str::FromStr>(raw: &str, header: &str) -> Result<T, AppError> {
    raw.parse().map_err(|_| {
        AppError::BadRequest(format!(
            "Header {} must be a non-negative integer, got \"{}\"",
            header, raw
        ))
    })
}

impl ChunkRequest {
    /// Parse and structurally validate the chunk headers. Performs no I/O.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let (
            Some(upload_id),
            Some(chunk_index),
            Some(total_chunks),
            Some(original_filename),
            Some(file_type),
            Some(file_size),
        ) = (
            header_text(headers, HEADER_UPLOAD_ID),
            header_text(headers, HEADER_CHUNK_INDEX),
            header_text(headers, HEADER_TOTAL_CHUNKS),
            header_text(headers, HEADER_ORIGINAL_FILENAME),
            header_text(headers, HEADER_FILE_TYPE),
            header_text(headers, HEADER_FILE_SIZE),
        )
        else {
            return Err(AppError::MissingChunkHeaders);
        };

        let chunk_index: u32 = parse_number(&chunk_index, "X-Chunk-Index")?;
        let total_chunks: u32 = parse_number(&total_chunks, "X-Total-Chunks")?;
        let file_size: u64 = parse_number(&file_size, "X-File-Size")?;

        if total_chunks == 0 {
            return Err(AppError::BadRequest(
                "X-Total-Chunks must be at least 1".to_string(),
            ));
        }
        if total_chunks > MAX_CHUNK_COUNT {
            return Err(AppError::BadRequest(format!(
                "X-Total-Chunks {} exceeds maximum {}; use a larger chunk size",
                total_chunks, MAX_CHUNK_COUNT
            )));
        }
        if chunk_index >= total_chunks {
            return Err(AppError::BadRequest(format!(
                "X-Chunk-Index {} is out of range for {} chunks",
                chunk_index, total_chunks
            )));
        }

        let upload_id =
            UploadId::parse(&upload_id).map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(Self {
            upload_id,
            chunk_index,
            total_chunks,
            original_filename,
            file_type,
            file_size,
            chunk_hash: header_text(headers, HEADER_CHUNK_HASH),
        })
    }

    pub fn is_first(&self) -> bool {
        self.chunk_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.chunk_index + 1 == self.total_chunks
    }
}

/// Size and type checks on the declared file, applied to the first chunk.
pub fn validate_file_meta(chunk: &ChunkRequest, config: &Config) -> Result<(), AppError> {
    let max = config.max_file_size_bytes();
    if chunk.file_size > max {
        return Err(AppError::FileTooLarge {
            file: chunk.original_filename.clone(),
            details: format!(
                "File \"{}\" ({} bytes) is too large. Max size is {}MB ({} bytes).",
                chunk.original_filename,
                chunk.file_size,
                max as f64 / (1024.0 * 1024.0),
                max
            ),
        });
    }

    if !mime::is_allowed(&chunk.file_type, config.allowed_file_types()) {
        return Err(AppError::UnsupportedFileType {
            file: chunk.original_filename.clone(),
            details: format!(
                "File type \"{}\" for file \"{}\" is not allowed. Allowed types: {}",
                chunk.file_type,
                chunk.original_filename,
                config.allowed_file_types().join(", ")
            ),
        });
    }

    Ok(())
}

/// Origin reported as `appUrl`: the configured public URL, else derived from the Host header.
fn app_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(base) = config.public_base_url() {
        return base.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("localhost:{}", config.server_port()));
    format!("http://{}", host)
}

async fn read_chunk_field(request: Request, max_chunk_size: usize) -> Result<Vec<u8>, AppError> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Upload body is not multipart");
        AppError::MissingChunkData
    })?;

    let malformed =
        |e: axum::extract::multipart::MultipartError| AppError::BadRequest(format!(
            "Malformed multipart body: {}",
            e.body_text()
        ));

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(CHUNK_FIELD) {
            continue;
        }

        let mut data = Vec::new();
        while let Some(bytes) = field.chunk().await.map_err(malformed)? {
            let size = data.len() + bytes.len();
            if size > max_chunk_size {
                return Err(AppError::ChunkTooLarge {
                    size,
                    max: max_chunk_size,
                });
            }
            data.extend_from_slice(&bytes);
        }
        return Ok(data);
    }

    Err(AppError::MissingChunkData)
}

fn chunk_write_error(err: StorageError) -> AppError {
    AppError::ChunkWrite(err.to_string())
}

/// Receive one chunk of a chunked upload
#[tracing::instrument(
    skip(state, request),
    fields(operation = "upload_chunk", request_id, upload_id, chunk_index, total_chunks)
)]
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, HttpAppError> {
    let chunk = ChunkRequest::from_headers(request.headers())?;

    let span = tracing::Span::current();
    if let Some(RequestId(request_id)) = request.extensions().get::<RequestId>() {
        span.record("request_id", request_id.as_str());
    }
    span.record("upload_id", chunk.upload_id.as_str());
    span.record("chunk_index", chunk.chunk_index);
    span.record("total_chunks", chunk.total_chunks);

    if chunk.is_first() {
        validate_file_meta(&chunk, &state.config)?;
        tracing::info!(
            filename = %chunk.original_filename,
            file_type = %chunk.file_type,
            file_size = chunk.file_size,
            "Starting chunked upload"
        );
    }

    let app_url = app_url(&state.config, request.headers());
    let data = read_chunk_field(request, state.config.max_chunk_size()).await?;

    if let Some(expected) = chunk.chunk_hash.as_deref() {
        let actual = chunk_digest(&data);
        if !actual.eq_ignore_ascii_case(expected) {
            tracing::warn!(expected = %expected, actual = %actual, "Chunk hash mismatch");
            if let Err(e) = state
                .store
                .remove_chunk(&chunk.upload_id, chunk.chunk_index)
                .await
            {
                tracing::warn!(error = %e, "Failed to remove chunk after hash mismatch");
            }
            return Err(AppError::IntegrityMismatch {
                chunk_index: chunk.chunk_index,
            }
            .into());
        }
    }

    state
        .store
        .ensure_upload_dir(&chunk.upload_id)
        .await
        .map_err(chunk_write_error)?;

    let resent = state
        .store
        .has_chunk(&chunk.upload_id, chunk.chunk_index)
        .await
        .unwrap_or(false);

    state
        .store
        .write_chunk(&chunk.upload_id, chunk.chunk_index, &data)
        .await
        .map_err(chunk_write_error)?;

    tracing::debug!(size_bytes = data.len(), resent, "Chunk stored");

    if !chunk.is_last() {
        let body = UploadResponse::ChunkSuccess(ChunkAccepted::new(
            chunk.chunk_index,
            chunk.total_chunks,
        ));
        return Ok(Json(body).into_response());
    }

    let stored = state.store.chunk_count(&chunk.upload_id).await?;
    if stored != chunk.total_chunks {
        tracing::warn!(
            stored,
            expected = chunk.total_chunks,
            "Chunk count differs from X-Total-Chunks before assembly"
        );
    }

    let final_name = sanitize_and_unique(&chunk.original_filename);
    let report = state
        .store
        .assemble(&chunk.upload_id, chunk.total_chunks, &final_name)
        .await;

    if !report.assembled {
        return Err(AppError::AssemblyFailed(report.failure.unwrap_or_default()).into());
    }

    if report.bytes_written != chunk.file_size {
        tracing::warn!(
            declared = chunk.file_size,
            written = report.bytes_written,
            "Assembled size differs from X-File-Size"
        );
    }

    tracing::info!(
        filename = %final_name,
        size_bytes = report.bytes_written,
        cleanup_warnings = report.cleanup_warnings.len(),
        "File assembled"
    );

    let body = UploadResponse::FileSuccess(FileAssembled::new(
        final_name,
        chunk.upload_id.to_string(),
        &app_url,
        report.file_hash.unwrap_or_default(),
    ));
    Ok(Json(body).into_response())
}
