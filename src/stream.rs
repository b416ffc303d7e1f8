use std::io::{self, BufReader, Read, Seek, SeekFrom};

use crate::error::{Error, Result};

/// A buffered source stream over a seekable WAVE file.
///
/// Tracks the absolute position so that read failures can report where the
/// input ran out.
#[derive(Debug)]
pub struct SourceStream<R: Read + Seek> {
    reader: BufReader<R>,
    abs_pos: u64,
}

impl<R: Read + Seek> SourceStream<R> {
    const BUFFER_SIZE: usize = 1024 * 16;

    /// Creates a new `SourceStream` positioned at the start of `reader`.
    pub fn new(reader: R) -> Self {
        let reader = BufReader::with_capacity(Self::BUFFER_SIZE, reader);
        Self { reader, abs_pos: 0 }
    }

    /// Reads exactly `N` bytes from the source stream.
    pub fn read_exact<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut result = [0u8; N];
        self.reader
            .read_exact(&mut result)
            .map_err(|e| Error::truncated(self.abs_pos, e))?;
        self.abs_pos += N as u64;
        Ok(result)
    }

    /// Reads a `u16` in little-endian format.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let bytes = self.read_exact::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Reads a `u32` in little-endian format.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_exact::<4>()?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads a 4-byte chunk tag, or `None` if the input ended cleanly before it.
    ///
    /// A tag cut short after its first byte is a truncation, not a clean end.
    pub fn read_tag_or_eof(&mut self) -> Result<Option<[u8; 4]>> {
        let mut tag = [0u8; 4];
        let mut filled = 0;
        while filled < tag.len() {
            match self.reader.read(&mut tag[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::truncated(self.abs_pos + filled as u64, e)),
            }
        }
        self.abs_pos += filled as u64;

        match filled {
            0 => Ok(None),
            4 => Ok(Some(tag)),
            _ => Err(Error::truncated(
                self.abs_pos,
                io::Error::new(io::ErrorKind::UnexpectedEof, "partial chunk id"),
            )),
        }
    }

    /// Reads exactly `n` bytes into a freshly allocated buffer.
    ///
    /// The buffer grows with the input, so a bogus length cannot force a huge
    /// allocation up front.
    pub fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>> {
        let start = self.abs_pos;
        let mut buffer = Vec::new();
        let read = (&mut self.reader)
            .take(n)
            .read_to_end(&mut buffer)
            .map_err(|e| Error::truncated(start, e))?;
        self.abs_pos += read as u64;

        if (read as u64) < n {
            return Err(Error::truncated(
                self.abs_pos,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {n} bytes, got {read}"),
                ),
            ));
        }
        Ok(buffer)
    }

    /// Moves forward by `n` bytes without reading them.
    ///
    /// Skipping past the end is allowed; the next read reports end of input.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let offset = i64::try_from(n).map_err(|_| {
            Error::truncated(
                self.abs_pos,
                io::Error::new(io::ErrorKind::InvalidInput, "skip too large"),
            )
        })?;
        self.reader
            .seek_relative(offset)
            .map_err(|e| Error::truncated(self.abs_pos, e))?;
        self.abs_pos += n;
        Ok(())
    }

    /// Seeks to a specific position in the stream.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let new_pos = self
            .reader
            .seek(pos)
            .map_err(|e| Error::truncated(self.abs_pos, e))?;
        self.abs_pos = new_pos;
        Ok(new_pos)
    }

    /// Returns the total length of the underlying source, keeping the position.
    pub fn byte_len(&mut self) -> Result<u64> {
        let end = self
            .reader
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::truncated(self.abs_pos, e))?;
        self.reader
            .seek(SeekFrom::Start(self.abs_pos))
            .map_err(|e| Error::truncated(self.abs_pos, e))?;
        Ok(end)
    }

    /// Returns the current position in the stream.
    pub fn position(&self) -> u64 {
        self.abs_pos
    }
}
