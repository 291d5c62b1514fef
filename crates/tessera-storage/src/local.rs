use crate::assembler::{self, AssemblyReport};
use crate::dirs::UploadDirs;
use crate::keys::{self, UploadId};
use crate::traits::{ArtifactStream, ChunkStore, StorageError, StorageResult};
use async_trait::async_trait;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem chunk store
#[derive(Debug, Clone)]
pub struct LocalChunkStore {
    dirs: UploadDirs,
}

impl LocalChunkStore {
    /// Create a new LocalChunkStore and ensure both roots exist.
    ///
    /// # Arguments
    /// * `final_root` - Directory for assembled artifacts (e.g., "public/uploads")
    /// * `tmp_root` - Directory for in-flight chunks (e.g., "public/uploads/tmp")
    pub async fn new(
        final_root: impl Into<PathBuf>,
        tmp_root: impl Into<PathBuf>,
    ) -> StorageResult<Self> {
        let dirs = UploadDirs::new(final_root, tmp_root);
        dirs.ensure_root_directories().await?;
        Ok(Self { dirs })
    }

    pub fn dirs(&self) -> &UploadDirs {
        &self.dirs
    }
}

#[async_trait]
impl ChunkStore for LocalChunkStore {
    async fn ensure_root_directories(&self) -> StorageResult<()> {
        self.dirs.ensure_root_directories().await
    }

    async fn ensure_upload_dir(&self, upload_id: &UploadId) -> StorageResult<()> {
        self.dirs.ensure_upload_subdirectory(upload_id).await?;
        Ok(())
    }

    async fn write_chunk(
        &self,
        upload_id: &UploadId,
        index: u32,
        data: &[u8],
    ) -> StorageResult<()> {
        let path = self.dirs.chunk_path(upload_id, index);
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            upload_id = %upload_id,
            chunk_index = index,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Chunk written"
        );

        Ok(())
    }

    async fn remove_chunk(&self, upload_id: &UploadId, index: u32) -> StorageResult<()> {
        let path = self.dirs.chunk_path(upload_id, index);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), upload_id = %upload_id, "Chunk removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn has_chunk(&self, upload_id: &UploadId, index: u32) -> StorageResult<bool> {
        let path = self.dirs.chunk_path(upload_id, index);
        Ok(fs::try_exists(&path).await?)
    }

    async fn chunk_count(&self, upload_id: &UploadId) -> StorageResult<u32> {
        let dir = self.dirs.upload_dir(upload_id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to list {}: {}",
                    dir.display(),
                    e
                )))
            }
        };

        let mut count = 0u32;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if keys::parse_chunk_file_name(name).is_some() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    async fn assemble(
        &self,
        upload_id: &UploadId,
        total_chunks: u32,
        final_name: &str,
    ) -> AssemblyReport {
        assembler::assemble_chunks(&self.dirs, upload_id, total_chunks, final_name).await
    }

    async fn open_artifact(&self, name: &str) -> StorageResult<(ArtifactStream, u64)> {
        let path = self.dirs.artifact_path(name)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        let name = name.to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(artifact = %name, error = %e, "Artifact stream read error");
                StorageError::ReadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok((Box::pin(stream), meta.len()))
    }

    async fn check_health(&self) -> StorageResult<()> {
        for dir in [self.dirs.final_root(), self.dirs.tmp_root()] {
            let meta = fs::metadata(dir).await.map_err(|e| {
                StorageError::DirectoryError(format!("{} unavailable: {}", dir.display(), e))
            })?;
            if !meta.is_dir() {
                return Err(StorageError::DirectoryError(format!(
                    "{} is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}
