use std::io;

use crate::chunk::ChunkId;

/// Specialized Result type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while reading or writing a WAVE container.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The outer "RIFF"/"WAVE" tags are not where they should be.
    #[error("Invalid container: expected {expected:?} tag, found {found:?}")]
    InvalidEnvelope { expected: ChunkId, found: ChunkId },

    /// The declared RIFF size disagrees with the real file length.
    #[error("Invalid file size: {actual} bytes, expected {expected}")]
    SizeMismatch { actual: u64, expected: u64 },

    /// "fmt " or "data" is absent from the chunk index.
    #[error("Missing required {id:?} chunk")]
    MissingChunk { id: ChunkId },

    /// A chunk id repeated while duplicates are rejected.
    #[error("Duplicate {id:?} chunk at offset {second} (first seen at {first})")]
    DuplicateChunk { id: ChunkId, first: u64, second: u64 },

    /// Input ended (or failed) before a fixed-size field was complete.
    #[error("Truncated file at offset {offset}: {source}")]
    TruncatedFile {
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// Bit depth outside 8/16/24/32. Only raised on request, decoding
    /// itself degrades to silence instead.
    #[error("Unsupported bits per sample: {bits_per_sample}")]
    UnsupportedBitDepth { bits_per_sample: u16 },

    /// The sink failed while a container was being written.
    #[error("Write failed: {0}")]
    WriteFailure(#[source] io::Error),

    /// Opening the input failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn truncated(offset: u64, source: io::Error) -> Self {
        Error::TruncatedFile { offset, source }
    }
}
