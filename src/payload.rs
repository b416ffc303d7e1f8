use std::io::{Read, Seek, SeekFrom};

use tracing::trace;

use crate::error::Result;
use crate::format::FormatDescriptor;
use crate::stream::SourceStream;

/// Raw sample bytes of a "data" chunk, plus what can be derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    bytes: Vec<u8>,
    samples_per_channel: u64,
    duration: f64,
}

impl AudioPayload {
    /// Wraps `bytes` and derives the frame count and duration from `format`.
    ///
    /// A partial trailing frame is not counted. A zero block align gives zero
    /// frames, and a zero sample rate gives a zero duration.
    pub fn new(bytes: Vec<u8>, format: &FormatDescriptor) -> Self {
        let samples_per_channel = (bytes.len() as u64)
            .checked_div(format.block_align as u64)
            .unwrap_or(0);
        let duration = if format.sample_rate == 0 {
            0.0
        } else {
            samples_per_channel as f64 / format.sample_rate as f64
        };

        Self {
            bytes,
            samples_per_channel,
            duration,
        }
    }

    /// Reads the payload of the "data" chunk whose header starts at `chunk_offset`.
    pub(crate) fn read<R: Read + Seek>(
        source_stream: &mut SourceStream<R>,
        chunk_offset: u64,
        format: &FormatDescriptor,
    ) -> Result<Self> {
        source_stream.seek(SeekFrom::Start(chunk_offset + 4))?;
        let num_bytes = source_stream.read_u32_le()?;
        trace!(offset = source_stream.position(), num_bytes, "reading payload");
        let bytes = source_stream.read_bytes(num_bytes as u64)?;
        Ok(Self::new(bytes, format))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of whole frames in the payload.
    pub fn samples_per_channel(&self) -> u64 {
        self.samples_per_channel
    }

    /// Length of the audio in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
