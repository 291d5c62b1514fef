//! Background removal of abandoned upload directories.
//!
//! An upload that never sends its last chunk leaves `{tmp_root}/{upload_id}` behind. The
//! reaper periodically deletes such directories once their last modification is older than
//! the configured age.

use crate::dirs::UploadDirs;
use crate::traits::{StorageError, StorageResult};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

pub struct StaleUploadReaper {
    dirs: UploadDirs,
    max_age: Duration,
    sweep_interval: Duration,
}

/// Handle to a running reaper task
pub struct ReaperHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl ReaperHandle {
    /// Stop the reaper and wait for the current sweep to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "Reaper task ended abnormally");
        }
    }
}

impl StaleUploadReaper {
    pub fn new(dirs: UploadDirs, max_age: Duration, sweep_interval: Duration) -> Self {
        Self {
            dirs,
            max_age,
            sweep_interval,
        }
    }

    /// Start the background sweep loop.
    pub fn start(self: Arc<Self>) -> ReaperHandle {
        let token = CancellationToken::new();
        let child = token.clone();

        let join = tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);

            tracing::info!(
                max_age_secs = self.max_age.as_secs(),
                interval_secs = self.sweep_interval.as_secs(),
                "Stale upload reaper started"
            );

            loop {
                tokio::select! {
                    _ = child.cancelled() => {
                        tracing::info!("Stale upload reaper stopped");
                        break;
                    }
                    _ = sweep_interval.tick() => {
                        match self.sweep_once().await {
                            Ok(0) => tracing::debug!("No stale uploads found"),
                            Ok(removed) => tracing::info!(removed, "Removed stale uploads"),
                            Err(e) => tracing::error!(error = %e, "Stale upload sweep failed"),
                        }
                    }
                }
            }
        });

        ReaperHandle { token, join }
    }

    /// Remove every upload directory whose modification time is at least `max_age` old.
    /// Returns the number of directories removed.
    pub async fn sweep_once(&self) -> StorageResult<usize> {
        let tmp_root = self.dirs.tmp_root();
        let mut entries = fs::read_dir(tmp_root).await.map_err(|e| {
            StorageError::DirectoryError(format!("Failed to list {}: {}", tmp_root.display(), e))
        })?;

        let now = SystemTime::now();
        let mut removed = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "Skipping unreadable entry"
                    );
                    continue;
                }
            };
            if !meta.is_dir() {
                continue;
            }

            let age = meta
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < self.max_age {
                continue;
            }

            let path = entry.path();
            match fs::remove_dir_all(&path).await {
                Ok(()) => {
                    tracing::info!(
                        path = %path.display(),
                        age_secs = age.as_secs(),
                        "Removed stale upload directory"
                    );
                    removed += 1;
                }
                Err(e) => {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "Failed to remove stale upload directory"
                    );
                }
            }
        }

        Ok(removed)
    }
}
