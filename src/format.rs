use std::io::{Read, Seek, SeekFrom};

use crate::error::Result;
use crate::stream::SourceStream;

/// PCM sample encodings the deinterleaver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Uint8,
    Int16,
    Int24,
    Int32,
}

impl SampleFormat {
    /// Maps a bit depth to its sample format, if it is one of 8/16/24/32.
    pub fn from_bits(bits_per_sample: u16) -> Option<Self> {
        match bits_per_sample {
            8 => Some(SampleFormat::Uint8),
            16 => Some(SampleFormat::Int16),
            24 => Some(SampleFormat::Int24),
            32 => Some(SampleFormat::Int32),
            _ => None,
        }
    }

    /// Returns the number of bytes per sample.
    pub fn bytes_per_sample(&self) -> u16 {
        match self {
            SampleFormat::Uint8 => 1,
            SampleFormat::Int16 => 2,
            SampleFormat::Int24 => 3,
            SampleFormat::Int32 => 4,
        }
    }
}

/// The fixed 16-byte body of a "fmt " chunk.
///
/// Fields are taken as-is; nothing is range checked here. Bad values show up
/// later, when samples are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Format code, 1 for PCM.
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    /// Bytes per multi-channel frame.
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatDescriptor {
    pub const PCM: u16 = 1;

    /// Size in bytes of the body this type reads and writes.
    pub const BODY_SIZE: u32 = 16;

    /// Describes plain PCM, deriving byte rate and block align from the
    /// channel count and bit depth.
    ///
    /// Returns `None` when block align does not fit a `u16` or byte rate does
    /// not fit a `u32`.
    pub fn pcm(num_channels: u16, sample_rate: u32, bits_per_sample: u16) -> Option<Self> {
        let block_align = num_channels.checked_mul(bits_per_sample.div_ceil(8))?;
        let byte_rate = sample_rate.checked_mul(block_align as u32)?;
        Some(Self {
            audio_format: Self::PCM,
            num_channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
        })
    }

    /// Reads the format body of the chunk whose header starts at `chunk_offset`.
    pub(crate) fn read<R: Read + Seek>(
        source_stream: &mut SourceStream<R>,
        chunk_offset: u64,
    ) -> Result<Self> {
        source_stream.seek(SeekFrom::Start(chunk_offset + 8))?;

        Ok(Self {
            audio_format: source_stream.read_u16_le()?,
            num_channels: source_stream.read_u16_le()?,
            sample_rate: source_stream.read_u32_le()?,
            byte_rate: source_stream.read_u32_le()?,
            block_align: source_stream.read_u16_le()?,
            bits_per_sample: source_stream.read_u16_le()?,
        })
    }

    /// 8-bit and narrower samples are unsigned; 9-bit and wider are signed.
    pub fn is_signed(&self) -> bool {
        self.bits_per_sample > 8
    }

    /// WAVE data is always little-endian.
    pub fn is_big_endian(&self) -> bool {
        false
    }

    pub fn sample_format(&self) -> Option<SampleFormat> {
        SampleFormat::from_bits(self.bits_per_sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Cursor;

    fn fmt_chunk_at(prefix: usize, body: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xAA; prefix];
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn reads_fields_in_order() {
        let mut body = Vec::new();
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&2u16.to_le_bytes());
        body.extend_from_slice(&44100u32.to_le_bytes());
        body.extend_from_slice(&176400u32.to_le_bytes());
        body.extend_from_slice(&4u16.to_le_bytes());
        body.extend_from_slice(&16u16.to_le_bytes());

        let mut stream = SourceStream::new(Cursor::new(fmt_chunk_at(20, &body)));
        let format = FormatDescriptor::read(&mut stream, 20).unwrap();

        assert_eq!(format, FormatDescriptor::pcm(2, 44100, 16).unwrap());
        assert!(format.is_signed());
        assert!(!format.is_big_endian());
        assert_eq!(format.sample_format(), Some(SampleFormat::Int16));
    }

    #[test]
    fn no_range_validation() {
        let mut body = vec![0u8; 16];
        body[14..16].copy_from_slice(&12u16.to_le_bytes());
        let mut stream = SourceStream::new(Cursor::new(fmt_chunk_at(0, &body)));
        let format = FormatDescriptor::read(&mut stream, 0).unwrap();

        assert_eq!(format.num_channels, 0);
        assert_eq!(format.block_align, 0);
        assert_eq!(format.bits_per_sample, 12);
        assert_eq!(format.sample_format(), None);
    }

    #[test]
    fn short_body_is_truncated() {
        let mut stream = SourceStream::new(Cursor::new(fmt_chunk_at(0, &[1, 0, 1, 0, 0x40])));
        match FormatDescriptor::read(&mut stream, 0) {
            Err(Error::TruncatedFile { offset, .. }) => assert_eq!(offset, 12),
            other => panic!("Expected TruncatedFile, got {:?}", other),
        }
    }

    #[test]
    fn signedness_follows_bit_depth() {
        assert!(!FormatDescriptor::pcm(1, 8000, 8).unwrap().is_signed());
        assert!(FormatDescriptor::pcm(1, 8000, 9).unwrap().is_signed());
        assert!(FormatDescriptor::pcm(1, 8000, 24).unwrap().is_signed());
    }

    #[test]
    fn pcm_derives_rates() {
        let format = FormatDescriptor::pcm(2, 48000, 24).unwrap();
        assert_eq!(format.block_align, 6);
        assert_eq!(format.byte_rate, 288_000);
        assert_eq!(SampleFormat::Int24.bytes_per_sample(), 3);
    }

    #[test]
    fn pcm_rejects_overflowing_fields() {
        // 40_000 channels * 2 bytes overflows block align
        assert_eq!(FormatDescriptor::pcm(40_000, 8000, 16), None);
        // 4e9 Hz * 32 bytes per frame overflows byte rate
        assert_eq!(FormatDescriptor::pcm(8, 4_000_000_000, 32), None);

        let widest = FormatDescriptor::pcm(16_383, 1, 32).unwrap();
        assert_eq!(widest.block_align, 65_532);
        let fastest = FormatDescriptor::pcm(1, u32::MAX, 8).unwrap();
        assert_eq!(fastest.byte_rate, u32::MAX);
    }
}
