//! Validation of the client-supplied names that end up in filesystem paths.
//!
//! An upload ID becomes a directory name under the temporary root and an artifact name a
//! file name under the final root, so both must be a single safe path segment.

use crate::traits::{StorageError, StorageResult};
use std::fmt;

/// Maximum accepted upload ID length
pub const MAX_UPLOAD_ID_LENGTH: usize = 128;

/// A validated upload identifier: 1..=128 characters from `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadId(String);

impl UploadId {
    pub fn parse(raw: &str) -> StorageResult<Self> {
        if raw.is_empty() || raw.len() > MAX_UPLOAD_ID_LENGTH {
            return Err(StorageError::InvalidKey(format!(
                "Upload ID must be between 1 and {} characters",
                MAX_UPLOAD_ID_LENGTH
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StorageError::InvalidKey(
                "Upload ID may only contain letters, digits, '-' and '_'".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File name of the chunk at `index`.
pub fn chunk_file_name(index: u32) -> String {
    format!("chunk-{}.tmp", index)
}

/// Parse a chunk file name back into its index.
pub fn parse_chunk_file_name(name: &str) -> Option<u32> {
    name.strip_prefix("chunk-")?
        .strip_suffix(".tmp")?
        .parse()
        .ok()
}

/// Reject artifact names that are not a single, visible path segment.
pub fn validate_artifact_name(name: &str) -> StorageResult<()> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(StorageError::InvalidKey(format!(
            "Invalid artifact name: {}",
            name
        )));
    }
    Ok(())
}
