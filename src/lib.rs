//! Reading and writing uncompressed PCM audio in RIFF/WAVE containers.
//!
//! A file is parsed in three steps over one seekable handle: the chunk scanner
//! validates the envelope and records where every chunk starts, then the
//! "fmt " and "data" chunks are read by offset. Samples are deinterleaved on
//! demand from the raw payload.

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use tracing::debug;

mod chunk;
mod error;
mod format;
mod payload;
mod samples;
mod stream;
mod writer;

pub use chunk::{ChunkId, ChunkIndex, DuplicatePolicy};
pub use error::{Error, Result};
pub use format::{FormatDescriptor, SampleFormat};
pub use payload::AudioPayload;
pub use samples::{deinterleave, Deinterleaved, SampleMatrix};
pub use writer::{write_container, write_file};

use chunk::ChunkScanner;
use stream::SourceStream;

/// Options that change how a [`WavReader`] treats malformed input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    pub duplicate_policy: DuplicatePolicy,
}

/// Reads a WAVE file from a seekable source.
///
/// The individual passes are exposed for callers that only need part of the
/// file; [`WavReader::finish`] runs all of them.
#[derive(Debug)]
pub struct WavReader<R: Read + Seek> {
    source_stream: SourceStream<R>,
    opts: ReaderOptions,
}

impl<R: Read + Seek> WavReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, opts: ReaderOptions) -> Self {
        Self {
            source_stream: SourceStream::new(reader),
            opts,
        }
    }

    /// Validates the envelope and indexes every top-level chunk.
    pub fn scan(&mut self) -> Result<ChunkIndex> {
        ChunkScanner::new(&mut self.source_stream, self.opts.duplicate_policy).scan()
    }

    /// Reads the "fmt " chunk located by `index`.
    pub fn read_format(&mut self, index: &ChunkIndex) -> Result<FormatDescriptor> {
        let offset = index.require(ChunkId::FMT)?;
        FormatDescriptor::read(&mut self.source_stream, offset)
    }

    /// Reads the "data" chunk located by `index`.
    pub fn read_payload(
        &mut self,
        index: &ChunkIndex,
        format: &FormatDescriptor,
    ) -> Result<AudioPayload> {
        let offset = index.require(ChunkId::DATA)?;
        AudioPayload::read(&mut self.source_stream, offset, format)
    }

    /// Runs the full parse. Any failure aborts it as a whole.
    pub fn finish(mut self) -> Result<ParsedAudio> {
        let chunks = self.scan()?;
        index_has_required_chunks(&chunks)?;

        let format = self.read_format(&chunks)?;
        let payload = self.read_payload(&chunks, &format)?;
        debug!(
            channels = format.num_channels,
            sample_rate = format.sample_rate,
            bits = format.bits_per_sample,
            bytes = payload.len(),
            "parsed wave file"
        );

        Ok(ParsedAudio {
            chunks,
            format,
            payload,
        })
    }
}

fn index_has_required_chunks(index: &ChunkIndex) -> Result<()> {
    index.require(ChunkId::FMT)?;
    index.require(ChunkId::DATA)?;
    Ok(())
}

/// A successfully parsed file. Immutable; samples are derived on request.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAudio {
    chunks: ChunkIndex,
    format: FormatDescriptor,
    payload: AudioPayload,
}

impl ParsedAudio {
    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    pub fn payload(&self) -> &AudioPayload {
        &self.payload
    }

    /// Raw interleaved sample bytes.
    pub fn data(&self) -> &[u8] {
        self.payload.bytes()
    }

    /// Offsets of every chunk seen while scanning, including ones not decoded.
    pub fn chunks(&self) -> &ChunkIndex {
        &self.chunks
    }

    pub fn duration(&self) -> f64 {
        self.payload.duration()
    }

    pub fn samples_per_channel(&self) -> u64 {
        self.payload.samples_per_channel()
    }

    /// Deinterleaves the payload. Allocates a new matrix on every call.
    pub fn samples(&self) -> Deinterleaved {
        deinterleave(
            self.payload.bytes(),
            self.format.num_channels,
            self.format.block_align,
            self.format.bits_per_sample,
        )
    }

    /// Writes format and payload back out as a two-chunk container.
    pub fn write_to<W: Write>(&self, sink: W) -> Result<()> {
        write_container(sink, self.payload.bytes(), &self.format)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_file(path, self.payload.bytes(), &self.format)
    }

    pub fn into_payload(self) -> AudioPayload {
        self.payload
    }
}

impl fmt::Display for ParsedAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = &self.format;
        writeln!(f, "Audio format: {}", format.audio_format)?;
        writeln!(f, "Number of channels: {}", format.num_channels)?;
        writeln!(f, "Sample rate (Hz): {}", format.sample_rate)?;
        writeln!(f, "Byte rate: {}", format.byte_rate)?;
        writeln!(f, "Block align (frame size): {}", format.block_align)?;
        writeln!(f, "Bits per sample: {}", format.bits_per_sample)?;
        writeln!(f, "Signed: {}", format.is_signed())?;
        writeln!(f, "Big endian: {}", format.is_big_endian())?;
        write!(f, "Duration (seconds): {}", self.duration())
    }
}

/// Parses a complete file held in memory.
pub fn parse(bytes: &[u8]) -> Result<ParsedAudio> {
    read(Cursor::new(bytes))
}

/// Parses a file from any seekable reader.
pub fn read<R: Read + Seek>(reader: R) -> Result<ParsedAudio> {
    WavReader::new(reader).finish()
}

/// Opens and parses the file at `path`.
pub fn open<P: AsRef<Path>>(path: P) -> Result<ParsedAudio> {
    let file = File::open(path)?;
    read(file)
}
