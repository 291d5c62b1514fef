//! Chunk codec: splits a file into fixed-size byte ranges and hashes each one.
//!
//! A zero-byte file is represented as a single empty chunk so that every upload,
//! whatever its size, has a last chunk that triggers assembly on the server.

use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

/// Default chunk size (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
/// Minimum chunk size accepted by the client (512 KiB)
pub const MIN_CHUNK_SIZE: usize = 512 * 1024;
/// Maximum chunk size accepted by the client and server (5 MiB)
pub const MAX_CHUNK_SIZE: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File of {file_size} bytes needs more than {max} chunks of {chunk_size} bytes")]
    TooManyChunks {
        file_size: u64,
        chunk_size: usize,
        max: u32,
    },

    #[error("Chunk index {index} is out of range (total chunks: {total})")]
    IndexOutOfRange { index: u32, total: u32 },
}

/// Lowercase hex SHA-256 of exactly `data`.
pub fn chunk_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Clamp a requested chunk size into `[min, max]`, mapping 0 to the default.
pub fn clamp_chunk_size(requested: usize, min: usize, max: usize) -> usize {
    let size = if requested == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        requested
    };
    size.clamp(min, max)
}

/// Byte range of one chunk within the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub index: u32,
    pub offset: u64,
    pub len: usize,
}

/// Chunk boundaries for a file of a known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    file_size: u64,
    chunk_size: usize,
    total_chunks: u32,
}

impl ChunkLayout {
    /// Build a layout. `chunk_size == 0` selects [`DEFAULT_CHUNK_SIZE`].
    pub fn new(file_size: u64, chunk_size: usize) -> Result<Self, CodecError> {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };

        let total = if file_size == 0 {
            1
        } else {
            file_size.div_ceil(chunk_size as u64)
        };
        let total_chunks = u32::try_from(total).map_err(|_| CodecError::TooManyChunks {
            file_size,
            chunk_size,
            max: u32::MAX,
        })?;

        Ok(Self {
            file_size,
            chunk_size,
            total_chunks,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    /// Range of the chunk at `index`, or `None` past the end.
    pub fn range(&self, index: u32) -> Option<ChunkRange> {
        if index >= self.total_chunks {
            return None;
        }
        let offset = index as u64 * self.chunk_size as u64;
        let remaining = self.file_size.saturating_sub(offset);
        let len = remaining.min(self.chunk_size as u64) as usize;
        Some(ChunkRange { index, offset, len })
    }

    /// All ranges in ascending index order.
    pub fn ranges(&self) -> impl Iterator<Item = ChunkRange> + '_ {
        (0..self.total_chunks).filter_map(move |i| self.range(i))
    }
}

/// One chunk of a file, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: u32,
    pub offset: u64,
    pub data: Vec<u8>,
    /// Hex SHA-256 of `data`
    pub hash: String,
}

impl Chunk {
    fn new(range: ChunkRange, data: Vec<u8>) -> Self {
        let hash = chunk_digest(&data);
        Self {
            index: range.index,
            offset: range.offset,
            data,
            hash,
        }
    }
}

/// Split an in-memory buffer into hashed chunks.
pub fn split_bytes(data: &[u8], chunk_size: usize) -> Result<Vec<Chunk>, CodecError> {
    let layout = ChunkLayout::new(data.len() as u64, chunk_size)?;
    Ok(layout
        .ranges()
        .map(|range| {
            let start = range.offset as usize;
            Chunk::new(range, data[start..start + range.len].to_vec())
        })
        .collect())
}

/// Sequential async reader producing hashed chunks from a file.
pub struct ChunkReader {
    file: File,
    layout: ChunkLayout,
    next_index: u32,
}

impl ChunkReader {
    /// Open `path` and compute its chunk layout.
    pub async fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self, CodecError> {
        let file = File::open(path.as_ref()).await?;
        let file_size = file.metadata().await?.len();
        let layout = ChunkLayout::new(file_size, chunk_size)?;

        Ok(Self {
            file,
            layout,
            next_index: 0,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.layout.file_size()
    }

    pub fn total_chunks(&self) -> u32 {
        self.layout.total_chunks()
    }

    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    /// Position the reader so the next chunk returned is `index`.
    pub async fn seek_to(&mut self, index: u32) -> Result<(), CodecError> {
        let range = self
            .layout
            .range(index)
            .ok_or(CodecError::IndexOutOfRange {
                index,
                total: self.layout.total_chunks(),
            })?;
        self.file.seek(SeekFrom::Start(range.offset)).await?;
        self.next_index = index;
        Ok(())
    }

    /// Read the next chunk, or `None` once every chunk has been produced.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, CodecError> {
        let Some(range) = self.layout.range(self.next_index) else {
            return Ok(None);
        };

        let mut data = vec![0u8; range.len];
        self.file.read_exact(&mut data).await?;
        self.next_index += 1;

        Ok(Some(Chunk::new(range, data)))
    }
}
