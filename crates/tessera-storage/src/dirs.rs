//! Upload directory manager: the final and temporary roots plus per-upload subdirectories.

use crate::keys::{self, UploadId};
use crate::traits::{StorageError, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct UploadDirs {
    final_root: PathBuf,
    tmp_root: PathBuf,
}

impl UploadDirs {
    pub fn new(final_root: impl Into<PathBuf>, tmp_root: impl Into<PathBuf>) -> Self {
        Self {
            final_root: final_root.into(),
            tmp_root: tmp_root.into(),
        }
    }

    pub fn final_root(&self) -> &Path {
        &self.final_root
    }

    pub fn tmp_root(&self) -> &Path {
        &self.tmp_root
    }

    /// Ensure both roots exist, creating intermediate segments as needed.
    ///
    /// Existing directories are left alone. Any failure other than "does not exist yet"
    /// (permissions, a regular file in the way) is returned.
    pub async fn ensure_root_directories(&self) -> StorageResult<()> {
        for dir in [&self.final_root, &self.tmp_root] {
            match fs::metadata(dir).await {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => {
                    return Err(StorageError::DirectoryError(format!(
                        "{} exists but is not a directory",
                        dir.display()
                    )));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    fs::create_dir_all(dir).await.map_err(|e| {
                        StorageError::DirectoryError(format!(
                            "Failed to create directory {}: {}",
                            dir.display(),
                            e
                        ))
                    })?;
                    tracing::info!(path = %dir.display(), "Created upload directory");
                }
                Err(e) => {
                    return Err(StorageError::DirectoryError(format!(
                        "Failed to inspect directory {}: {}",
                        dir.display(),
                        e
                    )));
                }
            }
        }
        Ok(())
    }

    /// Ensure `{tmp_root}/{upload_id}` exists and return it.
    pub async fn ensure_upload_subdirectory(&self, upload_id: &UploadId) -> StorageResult<PathBuf> {
        let dir = self.upload_dir(upload_id);
        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::DirectoryError(format!(
                "Failed to create upload directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(dir)
    }

    pub fn upload_dir(&self, upload_id: &UploadId) -> PathBuf {
        self.tmp_root.join(upload_id.as_str())
    }

    pub fn chunk_path(&self, upload_id: &UploadId, index: u32) -> PathBuf {
        self.upload_dir(upload_id).join(keys::chunk_file_name(index))
    }

    pub fn artifact_path(&self, name: &str) -> StorageResult<PathBuf> {
        keys::validate_artifact_name(name)?;
        Ok(self.final_root.join(name))
    }
}
