//! Sequential chunked file upload.

use crate::error::TransportError;
use crate::progress::{ProgressCallback, UploadProgress};
use crate::ApiClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::path::Path;
use tessera_core::codec::{clamp_chunk_size, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use tessera_core::mime::content_type_for;
use tessera_core::protocol::{
    CHUNK_FIELD, HEADER_CHUNK_HASH, HEADER_CHUNK_INDEX, HEADER_FILE_SIZE, HEADER_FILE_TYPE,
    HEADER_ORIGINAL_FILENAME, HEADER_TOTAL_CHUNKS, HEADER_UPLOAD_ID,
};
use tessera_core::{Chunk, ChunkReader, UploadResponse};
use tokio_util::sync::CancellationToken;

/// Per-upload options. The defaults start a fresh upload at chunk 0.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Reuse an existing upload ID (required to resume)
    pub upload_id: Option<String>,
    /// First chunk to send; earlier chunks are assumed already stored
    pub start_index: u32,
    /// MIME type announced to the server; inferred from the extension when unset
    pub mime_type: Option<String>,
    pub cancel: Option<CancellationToken>,
}

impl UploadOptions {
    pub fn resume(upload_id: impl Into<String>, start_index: u32) -> Self {
        Self {
            upload_id: Some(upload_id.into()),
            start_index,
            ..Self::default()
        }
    }
}

/// A file the server assembled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_name: String,
    pub file_url: String,
    pub url: String,
    pub ufs_url: String,
    pub upload_id: String,
    pub file_hash: String,
}

/// Splits files into chunks and sends them one after another.
///
/// The first failed chunk stops the upload; no further chunks are sent.
pub struct ChunkUploader {
    client: ApiClient,
    chunk_size: usize,
    on_progress: Option<ProgressCallback>,
}

impl ChunkUploader {
    /// `chunk_size` is clamped into the server's accepted range; 0 selects the default.
    pub fn new(client: ApiClient, chunk_size: usize) -> Self {
        Self {
            client,
            chunk_size: clamp_chunk_size(chunk_size, MIN_CHUNK_SIZE, MAX_CHUNK_SIZE),
            on_progress: None,
        }
    }

    pub fn with_progress(
        mut self,
        callback: impl Fn(UploadProgress) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        options: UploadOptions,
    ) -> Result<UploadedFile, TransportError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let mime_type = options
            .mime_type
            .clone()
            .unwrap_or_else(|| content_type_for(&file_name).to_string());
        let upload_id = options
            .upload_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut reader = ChunkReader::open(path, self.chunk_size).await?;
        let total_chunks = reader.total_chunks();
        let file_size = reader.file_size();
        let layout = reader.layout();

        if options.start_index >= total_chunks {
            return Err(TransportError::InvalidStartIndex {
                start: options.start_index,
                total_chunks,
            });
        }
        if options.start_index > 0 {
            reader.seek_to(options.start_index).await?;
        }

        tracing::info!(
            upload_id = %upload_id,
            file_size,
            total_chunks,
            start_index = options.start_index,
            "Starting chunked upload"
        );

        let meta = FileMeta {
            upload_id: &upload_id,
            file_name: &file_name,
            mime_type: &mime_type,
            file_size,
            total_chunks,
        };

        while let Some(chunk) = reader.next_chunk().await? {
            if options.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                tracing::info!(
                    upload_id = %upload_id,
                    next_chunk = chunk.index,
                    "Upload cancelled"
                );
                return Err(TransportError::Cancelled {
                    upload_id: upload_id.clone(),
                    next_chunk: chunk.index,
                });
            }

            let index = chunk.index;
            let response = self.send_chunk(&meta, chunk).await?;

            if let Some(callback) = &self.on_progress {
                let bytes_sent = layout
                    .range(index)
                    .map(|r| r.offset + r.len as u64)
                    .unwrap_or(file_size);
                callback(UploadProgress {
                    file_name: file_name.clone(),
                    upload_id: upload_id.clone(),
                    chunk_index: index,
                    total_chunks,
                    bytes_sent,
                    total_bytes: file_size,
                });
            }

            let is_last = index + 1 == total_chunks;
            match response {
                UploadResponse::ChunkSuccess(_) if !is_last => {
                    tracing::debug!(upload_id = %upload_id, chunk_index = index, "Chunk accepted");
                }
                UploadResponse::FileSuccess(body) if is_last => {
                    tracing::info!(
                        upload_id = %upload_id,
                        filename = %body.filename,
                        "Upload assembled"
                    );
                    return Ok(UploadedFile {
                        file_name: body.file_name,
                        file_url: body.file_url,
                        url: body.url,
                        ufs_url: body.ufs_url,
                        upload_id: body.custom_id,
                        file_hash: body.file_hash,
                    });
                }
                other => {
                    return Err(TransportError::UnexpectedResponse {
                        upload_id: upload_id.clone(),
                        chunk_index: index,
                        message: format!("unexpected response body: {:?}", other),
                    });
                }
            }
        }

        Err(TransportError::UnexpectedResponse {
            upload_id,
            chunk_index: total_chunks.saturating_sub(1),
            message: "file ended before the last chunk was acknowledged".to_string(),
        })
    }

    async fn send_chunk(
        &self,
        meta: &FileMeta<'_>,
        chunk: Chunk,
    ) -> Result<UploadResponse, TransportError> {
        let index = chunk.index;
        let headers = meta.headers(&chunk)?;
        let form = Form::new().part(CHUNK_FIELD, Part::bytes(chunk.data).file_name("blob"));

        let http_error = |source: reqwest::Error| TransportError::Http {
            upload_id: meta.upload_id.to_string(),
            chunk_index: index,
            source,
        };

        let response = self
            .client
            .post_chunk(headers, form)
            .await
            .map_err(http_error)?;
        let status = response.status();
        let text = response.text().await.map_err(http_error)?;

        let parsed: Result<UploadResponse, _> = serde_json::from_str(&text);
        match parsed {
            Ok(UploadResponse::Error(body)) => Err(TransportError::ChunkRejected {
                upload_id: meta.upload_id.to_string(),
                chunk_index: index,
                status: status.as_u16(),
                error: body.error,
                details: body.details,
                code: body.code,
                suggested_action: body.suggested_action,
            }),
            Ok(body) if status.is_success() => Ok(body),
            Ok(_) | Err(_) => {
                tracing::warn!(
                    upload_id = %meta.upload_id,
                    chunk_index = index,
                    status = %status,
                    "Unparseable upload response"
                );
                Err(TransportError::UnexpectedResponse {
                    upload_id: meta.upload_id.to_string(),
                    chunk_index: index,
                    message: format!("status {}: {}", status, text),
                })
            }
        }
    }
}

struct FileMeta<'a> {
    upload_id: &'a str,
    file_name: &'a str,
    mime_type: &'a str,
    file_size: u64,
    total_chunks: u32,
}

impl FileMeta<'_> {
    fn headers(&self, chunk: &Chunk) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        insert(&mut headers, HEADER_UPLOAD_ID, self.upload_id.as_bytes())?;
        insert(
            &mut headers,
            HEADER_CHUNK_INDEX,
            chunk.index.to_string().as_bytes(),
        )?;
        insert(
            &mut headers,
            HEADER_TOTAL_CHUNKS,
            self.total_chunks.to_string().as_bytes(),
        )?;
        // Raw UTF-8; the server decodes the header bytes itself
        insert(
            &mut headers,
            HEADER_ORIGINAL_FILENAME,
            self.file_name.as_bytes(),
        )?;
        insert(&mut headers, HEADER_FILE_TYPE, self.mime_type.as_bytes())?;
        insert(
            &mut headers,
            HEADER_FILE_SIZE,
            self.file_size.to_string().as_bytes(),
        )?;
        insert(&mut headers, HEADER_CHUNK_HASH, chunk.hash.as_bytes())?;
        Ok(headers)
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &[u8]) -> Result<(), TransportError> {
    let value = HeaderValue::from_bytes(value)
        .map_err(|e| TransportError::InvalidHeader(format!("{}: {}", name, e)))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}
