//! Record Codec
//!
//! Encodes one chunk (header + payload) into a block buffer and decodes it
//! back, verifying the CRC32.
//!
//! ```text
//! ┌───────────────┬──────────┬────────────┬──────────────────┐
//! │ Checksum u32  │ Type u8  │ Length u16 │ Payload [Length] │
//! └───────────────┴──────────┴────────────┴──────────────────┘
//!                 └──────────── covered by the CRC ──────────┘
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::error::RecordCorrupted;

use super::{BlockBuffer, CHECKSUM_SIZE, CHUNK_HEADER_SIZE};

const TYPE_OFFSET: usize = CHECKSUM_SIZE;
const LENGTH_OFFSET: usize = TYPE_OFFSET + 1;

/// Role of a chunk within its logical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChunkType {
    /// End of written data or padding
    Undefined = 0x00,
    /// A whole record
    Full = 0x01,
    /// Start of a record continued in later blocks
    First = 0x02,
    /// Continuation that does not complete the record
    Middle = 0x03,
    /// Continuation that completes the record
    Last = 0x04,
}

impl ChunkType {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Unknown codes map to `Undefined`
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => ChunkType::Full,
            0x02 => ChunkType::First,
            0x03 => ChunkType::Middle,
            0x04 => ChunkType::Last,
            _ => ChunkType::Undefined,
        }
    }
}

/// A logical record being written, with a cursor over the bytes already
/// framed into chunks.
#[derive(Debug, Clone, Copy)]
pub struct RecordSource<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> RecordSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Bytes consumed so far; `0` means no chunk was emitted yet
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }

    pub fn advance(&mut self, count: usize) {
        debug_assert!(count <= self.remaining());
        self.position += count;
    }
}

/// CRC32 (IEEE) of `bytes`
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// Frame as much of `source` as fits into `block` as one chunk of
/// `chunk_type`, advancing both cursors. Returns the payload length written.
///
/// The block must have room for at least a chunk header.
pub fn encode(block: &mut BlockBuffer, chunk_type: ChunkType, source: &mut RecordSource<'_>) -> usize {
    debug_assert!(block.is_writable(CHUNK_HEADER_SIZE));

    let length = (block.writable_bytes() - CHUNK_HEADER_SIZE).min(source.remaining());
    debug_assert!(length <= u16::MAX as usize);
    let payload = &source.remaining_slice()[..length];

    let region = block.writable_mut();
    {
        let mut out = &mut region[CHECKSUM_SIZE..];
        out.put_u8(chunk_type.code());
        out.put_u16(length as u16);
        out.put_slice(payload);
    }
    let crc = checksum(&region[CHECKSUM_SIZE..CHUNK_HEADER_SIZE + length]);
    (&mut region[..CHECKSUM_SIZE]).put_u32(crc);

    block.advance_writer(CHUNK_HEADER_SIZE + length);
    source.advance(length);
    length
}

/// Decode the chunk at the block's read cursor, appending its payload to
/// `destination`.
///
/// Returns `Undefined` without consuming anything when no chunk header is
/// readable or the stored checksum is `0`. A checksum mismatch, including a
/// declared length running past the readable bytes, is `RecordCorrupted`
/// and leaves the cursor in place.
pub fn decode(destination: &mut BytesMut, block: &mut BlockBuffer) -> Result<ChunkType, RecordCorrupted> {
    if !block.is_readable(CHUNK_HEADER_SIZE) {
        return Ok(ChunkType::Undefined);
    }
    let chunk_type = peek_type(block);
    let length = peek_length(block) as usize;

    let expected = peek_checksum(block);
    if expected == 0 {
        return Ok(ChunkType::Undefined);
    }

    let readable = block.readable();
    let end = (CHUNK_HEADER_SIZE + length).min(readable.len());
    let calculated = checksum(&readable[CHECKSUM_SIZE..end]);
    if expected != calculated || end < CHUNK_HEADER_SIZE + length {
        return Err(RecordCorrupted {
            expected_checksum: expected,
            calculated_checksum: calculated,
        });
    }

    destination.extend_from_slice(&readable[CHUNK_HEADER_SIZE..end]);
    block.advance_reader(CHUNK_HEADER_SIZE + length);
    Ok(chunk_type)
}

/// Stored checksum of the chunk at the read cursor, `0` if none is readable
pub fn peek_checksum(block: &BlockBuffer) -> u32 {
    if !block.is_readable(CHUNK_HEADER_SIZE) {
        return 0;
    }
    block.readable().get_u32()
}

/// Type of the chunk at the read cursor, `Undefined` if none is readable
pub fn peek_type(block: &BlockBuffer) -> ChunkType {
    if !block.is_readable(CHUNK_HEADER_SIZE) {
        return ChunkType::Undefined;
    }
    ChunkType::from_code(block.readable()[TYPE_OFFSET])
}

/// Payload length of the chunk at the read cursor, `0` if none is readable
pub fn peek_length(block: &BlockBuffer) -> u16 {
    if !block.is_readable(CHUNK_HEADER_SIZE) {
        return 0;
    }
    (&block.readable()[LENGTH_OFFSET..]).get_u16()
}
