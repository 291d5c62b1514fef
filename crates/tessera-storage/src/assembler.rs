//! Chunk assembly into the final artifact.
//!
//! Chunks are streamed into the artifact strictly in index order and the SHA-256 of the
//! assembled bytes is computed on the way through. Cleanup of the temporary chunks after a
//! successful assembly is best-effort: failures there become warnings on the report and
//! never turn a completed artifact into an error.

use crate::dirs::UploadDirs;
use crate::keys::{self, UploadId};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

/// A non-fatal problem hit while removing temporary files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of an assembly attempt.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub assembled: bool,
    pub artifact_path: PathBuf,
    pub bytes_written: u64,
    /// Lowercase hex SHA-256 of the artifact, set when `assembled` is true.
    pub file_hash: Option<String>,
    /// Why assembly failed, set when `assembled` is false.
    pub failure: Option<String>,
    pub cleanup_warnings: Vec<CleanupWarning>,
}

impl AssemblyReport {
    fn failed(artifact_path: PathBuf, failure: String) -> Self {
        Self {
            assembled: false,
            artifact_path,
            bytes_written: 0,
            file_hash: None,
            failure: Some(failure),
            cleanup_warnings: Vec::new(),
        }
    }
}

/// Concatenate `chunk-0.tmp ..= chunk-{total-1}.tmp` of `upload_id` into
/// `{final_root}/{final_name}`.
///
/// On success each chunk file is deleted and then the upload directory is removed. On failure
/// the partial artifact and every chunk consumed so far are removed, and the upload directory
/// is left in place.
pub async fn assemble_chunks(
    dirs: &UploadDirs,
    upload_id: &UploadId,
    total_chunks: u32,
    final_name: &str,
) -> AssemblyReport {
    let artifact_path = match dirs.artifact_path(final_name) {
        Ok(path) => path,
        Err(e) => return AssemblyReport::failed(dirs.final_root().join(final_name), e.to_string()),
    };

    if total_chunks == 0 {
        return AssemblyReport::failed(artifact_path, "No chunks to assemble".to_string());
    }

    if let Err(e) = fs::create_dir_all(dirs.final_root()).await {
        return AssemblyReport::failed(
            artifact_path,
            format!(
                "Failed to create directory {}: {}",
                dirs.final_root().display(),
                e
            ),
        );
    }

    let start = std::time::Instant::now();
    let chunk_paths: Vec<PathBuf> = (0..total_chunks)
        .map(|i| dirs.chunk_path(upload_id, i))
        .collect();

    let mut consumed = 0usize;
    let written = write_artifact(&artifact_path, &chunk_paths, &mut consumed).await;

    match written {
        Ok((bytes_written, file_hash)) => {
            let mut cleanup_warnings = Vec::new();
            for path in &chunk_paths {
                if let Err(e) = fs::remove_file(path).await {
                    cleanup_warnings.push(CleanupWarning {
                        path: path.clone(),
                        message: format!("Failed to delete chunk: {}", e),
                    });
                }
            }

            let upload_dir = dirs.upload_dir(upload_id);
            if let Err(e) = fs::remove_dir(&upload_dir).await {
                cleanup_warnings.push(CleanupWarning {
                    path: upload_dir,
                    message: format!("Failed to remove upload directory: {}", e),
                });
            }

            for warning in &cleanup_warnings {
                tracing::warn!(
                    upload_id = %upload_id,
                    path = %warning.path.display(),
                    error = %warning.message,
                    "Chunk cleanup failed after assembly"
                );
            }

            tracing::info!(
                upload_id = %upload_id,
                path = %artifact_path.display(),
                total_chunks = total_chunks,
                size_bytes = bytes_written,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Chunk assembly successful"
            );

            AssemblyReport {
                assembled: true,
                artifact_path,
                bytes_written,
                file_hash: Some(file_hash),
                failure: None,
                cleanup_warnings,
            }
        }
        Err(failure) => {
            tracing::error!(
                upload_id = %upload_id,
                path = %artifact_path.display(),
                chunks_consumed = consumed,
                error = %failure,
                "Chunk assembly failed"
            );

            let mut report = AssemblyReport::failed(artifact_path.clone(), failure);
            if let Err(e) = fs::remove_file(&artifact_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    report.cleanup_warnings.push(CleanupWarning {
                        path: artifact_path,
                        message: format!("Failed to remove partial artifact: {}", e),
                    });
                }
            }
            for path in chunk_paths.iter().take(consumed) {
                if let Err(e) = fs::remove_file(path).await {
                    report.cleanup_warnings.push(CleanupWarning {
                        path: path.clone(),
                        message: format!("Failed to delete chunk: {}", e),
                    });
                }
            }
            report
        }
    }
}

async fn write_artifact(
    artifact_path: &Path,
    chunk_paths: &[PathBuf],
    consumed: &mut usize,
) -> Result<(u64, String), String> {
    let file = fs::File::create(artifact_path).await.map_err(|e| {
        format!(
            "Failed to create file {}: {}",
            artifact_path.display(),
            e
        )
    })?;
    let mut writer = BufWriter::new(file);
    let mut hasher = Sha256::new();
    let mut bytes_written = 0u64;

    for (index, path) in chunk_paths.iter().enumerate() {
        let data = fs::read(path).await.map_err(|e| {
            let name = keys::chunk_file_name(index as u32);
            format!("Failed to read {}: {}", name, e)
        })?;
        *consumed = index + 1;

        hasher.update(&data);
        writer.write_all(&data).await.map_err(|e| {
            format!(
                "Failed to write file {}: {}",
                artifact_path.display(),
                e
            )
        })?;
        bytes_written += data.len() as u64;
    }

    writer.flush().await.map_err(|e| {
        format!("Failed to flush file {}: {}", artifact_path.display(), e)
    })?;
    writer.into_inner().sync_all().await.map_err(|e| {
        format!("Failed to sync file {}: {}", artifact_path.display(), e)
    })?;

    Ok((bytes_written, hex::encode(hasher.finalize())))
}
