use enum_dispatch::enum_dispatch;
use tracing::warn;

use crate::error::{Error, Result};
use crate::format::SampleFormat;

/// Decodes one little-endian PCM sample.
#[enum_dispatch]
trait SampleDecoder {
    /// Bytes consumed per sample.
    fn width(&self) -> usize;
    /// `bytes` is exactly `width()` long.
    fn decode(&self, bytes: &[u8]) -> f32;
}

/// Dispatches to the decoder matching the bit depth.
#[enum_dispatch(SampleDecoder)]
enum Decoder {
    Uint8Decoder,
    Int16Decoder,
    Int24Decoder,
    Int32Decoder,
}

impl From<SampleFormat> for Decoder {
    fn from(format: SampleFormat) -> Self {
        match format {
            SampleFormat::Uint8 => Uint8Decoder.into(),
            SampleFormat::Int16 => Int16Decoder.into(),
            SampleFormat::Int24 => Int24Decoder.into(),
            SampleFormat::Int32 => Int32Decoder.into(),
        }
    }
}

struct Uint8Decoder;

impl SampleDecoder for Uint8Decoder {
    #[inline]
    fn width(&self) -> usize {
        1
    }

    /// Unsigned, 0 to 255. No re-centering.
    #[inline]
    fn decode(&self, bytes: &[u8]) -> f32 {
        bytes[0] as f32
    }
}

struct Int16Decoder;

impl SampleDecoder for Int16Decoder {
    #[inline]
    fn width(&self) -> usize {
        2
    }

    #[inline]
    fn decode(&self, bytes: &[u8]) -> f32 {
        i16::from_le_bytes([bytes[0], bytes[1]]) as f32
    }
}

struct Int24Decoder;

impl SampleDecoder for Int24Decoder {
    #[inline]
    fn width(&self) -> usize {
        3
    }

    /// Sign-extends from bit 23, so 0x800000 and up read as negative.
    #[inline]
    fn decode(&self, bytes: &[u8]) -> f32 {
        let raw = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]);
        ((raw << 8) >> 8) as f32
    }
}

struct Int32Decoder;

impl SampleDecoder for Int32Decoder {
    #[inline]
    fn width(&self) -> usize {
        4
    }

    #[inline]
    fn decode(&self, bytes: &[u8]) -> f32 {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32
    }
}

/// Per-channel sample values: one row per channel, columns in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    rows: Vec<Vec<f32>>,
    samples_per_channel: usize,
}

impl SampleMatrix {
    pub fn zeros(num_channels: usize, samples_per_channel: usize) -> Self {
        Self {
            rows: vec![vec![0.0; samples_per_channel]; num_channels],
            samples_per_channel,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.rows.len()
    }

    pub fn samples_per_channel(&self) -> usize {
        self.samples_per_channel
    }

    pub fn channel(&self, channel: usize) -> Option<&[f32]> {
        self.rows.get(channel).map(Vec::as_slice)
    }

    pub fn get(&self, channel: usize, index: usize) -> Option<f32> {
        self.rows.get(channel)?.get(index).copied()
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn into_rows(self) -> Vec<Vec<f32>> {
        self.rows
    }
}

/// Outcome of [`deinterleave`].
///
/// Decoding never fails: an unsupported bit depth still produces a matrix of
/// the right shape, filled with zeros, so callers that only need metadata are
/// unaffected.
#[derive(Debug, Clone, PartialEq)]
pub enum Deinterleaved {
    Decoded(SampleMatrix),
    Unsupported {
        bits_per_sample: u16,
        matrix: SampleMatrix,
    },
}

impl Deinterleaved {
    pub fn is_decoded(&self) -> bool {
        matches!(self, Deinterleaved::Decoded(_))
    }

    pub fn matrix(&self) -> &SampleMatrix {
        match self {
            Deinterleaved::Decoded(matrix) | Deinterleaved::Unsupported { matrix, .. } => matrix,
        }
    }

    /// Returns the matrix, zero-filled if the bit depth was unsupported.
    pub fn into_matrix(self) -> SampleMatrix {
        match self {
            Deinterleaved::Decoded(matrix) | Deinterleaved::Unsupported { matrix, .. } => matrix,
        }
    }

    /// Turns an unsupported bit depth into [`Error::UnsupportedBitDepth`].
    pub fn into_result(self) -> Result<SampleMatrix> {
        match self {
            Deinterleaved::Decoded(matrix) => Ok(matrix),
            Deinterleaved::Unsupported {
                bits_per_sample, ..
            } => Err(Error::UnsupportedBitDepth { bits_per_sample }),
        }
    }
}

/// Splits interleaved little-endian PCM into per-channel samples.
///
/// The matrix is always `num_channels` x `payload.len() / block_align`.
/// Samples are consumed sequentially, `bits_per_sample / 8` bytes each, frame
/// by frame and channel by channel. Decoding stops once the payload cannot
/// hold another whole sample; cells not reached stay at zero.
pub fn deinterleave(
    payload: &[u8],
    num_channels: u16,
    block_align: u16,
    bits_per_sample: u16,
) -> Deinterleaved {
    let samples_per_channel = payload
        .len()
        .checked_div(block_align as usize)
        .unwrap_or(0);
    let mut matrix = SampleMatrix::zeros(num_channels as usize, samples_per_channel);

    let Some(format) = SampleFormat::from_bits(bits_per_sample) else {
        warn!(bits_per_sample, "unsupported bits per sample, returning silence");
        return Deinterleaved::Unsupported {
            bits_per_sample,
            matrix,
        };
    };

    let decoder = Decoder::from(format);
    let mut samples = payload.chunks_exact(decoder.width());

    'frames: for index in 0..samples_per_channel {
        for row in matrix.rows.iter_mut() {
            let Some(bytes) = samples.next() else {
                break 'frames;
            };
            row[index] = decoder.decode(bytes);
        }
    }

    Deinterleaved::Decoded(matrix)
}
