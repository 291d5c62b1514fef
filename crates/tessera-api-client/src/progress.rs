/// Snapshot taken after a chunk's round-trip completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub file_name: String,
    pub upload_id: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Completion percentage in `0.0..=100.0`, by chunks acknowledged.
    pub fn percent(&self) -> f64 {
        if self.total_chunks == 0 {
            return 100.0;
        }
        (self.chunk_index + 1) as f64 / self.total_chunks as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.chunk_index + 1 == self.total_chunks
    }
}

pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;
