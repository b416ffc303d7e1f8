use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::stream::SourceStream;

/// A 4-byte RIFF chunk identifier.
///
/// Identifiers are raw bytes; they are rendered one byte per character
/// (ISO-8859-1), so any id can be displayed without loss.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    pub const RIFF: ChunkId = ChunkId(*b"RIFF");
    pub const WAVE: ChunkId = ChunkId(*b"WAVE");
    pub const FMT: ChunkId = ChunkId(*b"fmt ");
    pub const DATA: ChunkId = ChunkId(*b"data");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for ChunkId {
    fn from(bytes: [u8; 4]) -> Self {
        ChunkId(bytes)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

/// What the scanner does when a chunk id shows up more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The later offset replaces the earlier one.
    #[default]
    LastWins,
    /// Fail the scan with [`Error::DuplicateChunk`].
    Reject,
}

/// Ordered mapping from chunk id to the byte offset of its header.
///
/// Entries keep the order in which ids were first seen. The `RIFF` chunk
/// itself is always recorded at offset 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkIndex {
    entries: Vec<(ChunkId, u64)>,
}

impl ChunkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id` at `offset`, returning the offset it replaced, if any.
    pub fn insert(&mut self, id: ChunkId, offset: u64) -> Option<u64> {
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some((_, existing)) => Some(std::mem::replace(existing, offset)),
            None => {
                self.entries.push((id, offset));
                None
            }
        }
    }

    pub fn get(&self, id: &ChunkId) -> Option<u64> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|&(_, offset)| offset)
    }

    /// Returns the offset of `id`, or [`Error::MissingChunk`] naming it.
    pub fn require(&self, id: ChunkId) -> Result<u64> {
        self.get(&id).ok_or(Error::MissingChunk { id })
    }

    pub fn contains(&self, id: &ChunkId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.entries.iter().map(|&(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, u64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ChunkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (id, offset)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}={offset}")?;
        }
        write!(f, "}}")
    }
}

/// Walks the top-level structure of a WAVE file once, recording where each
/// chunk starts.
pub(crate) struct ChunkScanner<'a, R: Read + Seek> {
    source_stream: &'a mut SourceStream<R>,
    policy: DuplicatePolicy,
    cursor: u64,
}

impl<'a, R: Read + Seek> ChunkScanner<'a, R> {
    /// Offset of the first sub-chunk, right after "RIFF" + size + "WAVE".
    const FIRST_CHUNK_OFFSET: u64 = 12;

    pub fn new(source_stream: &'a mut SourceStream<R>, policy: DuplicatePolicy) -> Self {
        Self {
            source_stream,
            policy,
            cursor: 0,
        }
    }

    /// Validates the RIFF envelope and indexes every sub-chunk.
    pub fn scan(mut self) -> Result<ChunkIndex> {
        self.source_stream.seek(SeekFrom::Start(0))?;
        let file_len = self.source_stream.byte_len()?;

        let riff = ChunkId(self.source_stream.read_exact::<4>()?);
        if riff != ChunkId::RIFF {
            return Err(Error::InvalidEnvelope {
                expected: ChunkId::RIFF,
                found: riff,
            });
        }

        let declared = self.source_stream.read_u32_le()? as u64;

        let wave = ChunkId(self.source_stream.read_exact::<4>()?);
        if wave != ChunkId::WAVE {
            return Err(Error::InvalidEnvelope {
                expected: ChunkId::WAVE,
                found: wave,
            });
        }

        if file_len.checked_sub(8) != Some(declared) {
            return Err(Error::SizeMismatch {
                actual: file_len,
                expected: declared + 8,
            });
        }

        let mut index = ChunkIndex::new();
        index.insert(ChunkId::RIFF, 0);
        self.cursor = Self::FIRST_CHUNK_OFFSET;

        while let Some(tag) = self.source_stream.read_tag_or_eof()? {
            let id = ChunkId(tag);
            self.record(&mut index, id)?;

            let chunk_size = self.source_stream.read_u32_le()? as u64;
            trace!(chunk = %id, offset = self.cursor, size = chunk_size, "found chunk");

            self.source_stream.skip(chunk_size)?;
            self.cursor += chunk_size + 8;
        }

        debug!(%index, file_len, "scanned chunks");
        Ok(index)
    }

    fn record(&self, index: &mut ChunkIndex, id: ChunkId) -> Result<()> {
        if self.policy == DuplicatePolicy::Reject {
            if let Some(first) = index.get(&id) {
                return Err(Error::DuplicateChunk {
                    id,
                    first,
                    second: self.cursor,
                });
            }
        }
        if let Some(previous) = index.insert(id, self.cursor) {
            debug!(chunk = %id, previous, offset = self.cursor, "duplicate chunk, keeping the later one");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn riff(body: &[u8]) -> Vec<u8> {
        let mut file = Vec::new();
        file.extend_from_slice(b"RIFF");
        file.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
        file.extend_from_slice(b"WAVE");
        file.extend_from_slice(body);
        file
    }

    fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn scan(bytes: Vec<u8>, policy: DuplicatePolicy) -> Result<ChunkIndex> {
        let mut stream = SourceStream::new(Cursor::new(bytes));
        ChunkScanner::new(&mut stream, policy).scan()
    }

    #[test]
    fn indexes_chunks_in_file_order() {
        let body = [
            chunk(b"fmt ", &[0u8; 16]),
            chunk(b"LIST", &[0u8; 10]),
            chunk(b"data", &[1, 2, 3, 4]),
        ]
        .concat();
        let index = scan(riff(&body), DuplicatePolicy::LastWins).unwrap();

        let entries: Vec<_> = index.iter().collect();
        assert_eq!(
            entries,
            vec![
                (ChunkId::RIFF, 0),
                (ChunkId::FMT, 12),
                (ChunkId(*b"LIST"), 36),
                (ChunkId::DATA, 54),
            ]
        );
    }

    #[test]
    fn data_before_format_is_fine() {
        let body = [chunk(b"data", &[0u8; 2]), chunk(b"fmt ", &[0u8; 16])].concat();
        let index = scan(riff(&body), DuplicatePolicy::LastWins).unwrap();
        assert_eq!(index.get(&ChunkId::DATA), Some(12));
        assert_eq!(index.get(&ChunkId::FMT), Some(22));
    }

    #[test]
    fn bad_riff_tag() {
        let mut bytes = riff(&chunk(b"fmt ", &[0u8; 16]));
        bytes[..4].copy_from_slice(b"RIFX");
        match scan(bytes, DuplicatePolicy::LastWins) {
            Err(Error::InvalidEnvelope { expected, found }) => {
                assert_eq!(expected, ChunkId::RIFF);
                assert_eq!(found, ChunkId(*b"RIFX"));
            }
            other => panic!("Expected InvalidEnvelope, got {:?}", other),
        }
    }

    #[test]
    fn bad_wave_tag() {
        let mut bytes = riff(&chunk(b"fmt ", &[0u8; 16]));
        bytes[8..12].copy_from_slice(b"AVI ");
        match scan(bytes, DuplicatePolicy::LastWins) {
            Err(Error::InvalidEnvelope { expected, found }) => {
                assert_eq!(expected, ChunkId::WAVE);
                assert_eq!(found, ChunkId(*b"AVI "));
            }
            other => panic!("Expected InvalidEnvelope, got {:?}", other),
        }
    }

    #[test]
    fn declared_size_must_match_length() {
        let mut bytes = riff(&chunk(b"data", &[0u8; 4]));
        bytes.push(0);
        match scan(bytes, DuplicatePolicy::LastWins) {
            Err(Error::SizeMismatch { actual, expected }) => {
                assert_eq!(actual, 25);
                assert_eq!(expected, 24);
            }
            other => panic!("Expected SizeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn header_shorter_than_envelope_is_truncated() {
        let bytes = b"RIFF\x04\x00".to_vec();
        assert!(matches!(
            scan(bytes, DuplicatePolicy::LastWins),
            Err(Error::TruncatedFile { .. })
        ));
    }

    #[test]
    fn chunk_header_cut_after_id_is_truncated() {
        let body = [chunk(b"fmt ", &[0u8; 16]), b"da".to_vec()].concat();
        assert!(matches!(
            scan(riff(&body), DuplicatePolicy::LastWins),
            Err(Error::TruncatedFile { .. })
        ));

        let body = [chunk(b"fmt ", &[0u8; 16]), b"data\x01".to_vec()].concat();
        assert!(matches!(
            scan(riff(&body), DuplicatePolicy::LastWins),
            Err(Error::TruncatedFile { .. })
        ));
    }

    #[test]
    fn duplicate_keeps_last_offset_and_first_position() {
        let body = [
            chunk(b"data", &[0u8; 2]),
            chunk(b"fmt ", &[0u8; 16]),
            chunk(b"data", &[0u8; 4]),
        ]
        .concat();
        let index = scan(riff(&body), DuplicatePolicy::LastWins).unwrap();
        let ids: Vec<_> = index.ids().collect();
        assert_eq!(ids, vec![ChunkId::RIFF, ChunkId::DATA, ChunkId::FMT]);
        assert_eq!(index.get(&ChunkId::DATA), Some(46));
    }

    #[test]
    fn duplicate_rejected_when_configured() {
        let body = [chunk(b"data", &[0u8; 2]), chunk(b"data", &[0u8; 2])].concat();
        match scan(riff(&body), DuplicatePolicy::Reject) {
            Err(Error::DuplicateChunk { id, first, second }) => {
                assert_eq!(id, ChunkId::DATA);
                assert_eq!(first, 12);
                assert_eq!(second, 22);
            }
            other => panic!("Expected DuplicateChunk, got {:?}", other),
        }
    }

    #[test]
    fn missing_chunk_names_the_id() {
        let index = ChunkIndex::new();
        match index.require(ChunkId::DATA) {
            Err(e @ Error::MissingChunk { .. }) => {
                assert_eq!(e.to_string(), "Missing required \"data\" chunk")
            }
            other => panic!("Expected MissingChunk, got {:?}", other),
        }
    }

    #[test]
    fn index_display_lists_offsets() {
        let mut index = ChunkIndex::new();
        index.insert(ChunkId::RIFF, 0);
        index.insert(ChunkId::FMT, 12);
        index.insert(ChunkId::DATA, 36);
        assert_eq!(index.to_string(), "{RIFF=0, fmt =12, data=36}");
    }
}
