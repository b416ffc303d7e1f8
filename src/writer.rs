use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::chunk::ChunkId;
use crate::error::{Error, Result};
use crate::format::FormatDescriptor;

/// Bytes between the RIFF size field and the start of the sample data:
/// "WAVE" + "fmt " header + 16-byte format body + "data" header.
const HEADER_OVERHEAD: u32 = 4 + 8 + FormatDescriptor::BODY_SIZE + 8;

/// Writes a canonical two-chunk WAVE container ("fmt " then "data") to `sink`.
///
/// Nothing besides the format and the payload is written, so other chunks of
/// a parsed file do not survive a round trip.
pub fn write_container<W: Write>(
    mut sink: W,
    payload: &[u8],
    format: &FormatDescriptor,
) -> Result<()> {
    let data_len = u32::try_from(payload.len())
        .ok()
        .filter(|len| len.checked_add(HEADER_OVERHEAD).is_some())
        .ok_or_else(|| {
            Error::WriteFailure(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("payload of {} bytes does not fit a RIFF container", payload.len()),
            ))
        })?;

    emit(&mut sink, payload, data_len, format).map_err(Error::WriteFailure)?;
    debug!(data_len, "wrote container");
    Ok(())
}

/// Creates (or truncates) `path` and writes a container to it.
pub fn write_file<P: AsRef<Path>>(
    path: P,
    payload: &[u8],
    format: &FormatDescriptor,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(Error::WriteFailure)?;
    debug!(path = %path.display(), "writing file");
    write_container(BufWriter::new(file), payload, format)
}

fn emit<W: Write>(
    sink: &mut W,
    payload: &[u8],
    data_len: u32,
    format: &FormatDescriptor,
) -> io::Result<()> {
    sink.write_all(ChunkId::RIFF.as_bytes())?;
    sink.write_all(&(HEADER_OVERHEAD + data_len).to_le_bytes())?;
    sink.write_all(ChunkId::WAVE.as_bytes())?;

    sink.write_all(ChunkId::FMT.as_bytes())?;
    sink.write_all(&FormatDescriptor::BODY_SIZE.to_le_bytes())?;
    sink.write_all(&format.audio_format.to_le_bytes())?;
    sink.write_all(&format.num_channels.to_le_bytes())?;
    sink.write_all(&format.sample_rate.to_le_bytes())?;
    sink.write_all(&format.byte_rate.to_le_bytes())?;
    sink.write_all(&format.block_align.to_le_bytes())?;
    sink.write_all(&format.bits_per_sample.to_le_bytes())?;

    sink.write_all(ChunkId::DATA.as_bytes())?;
    sink.write_all(&data_len.to_le_bytes())?;
    sink.write_all(payload)?;

    sink.flush()
}
