//! On-disk Format Module
//!
//! Block/chunk framing shared by the appender and the reader.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ File Header (5 bytes, written once)                     │
//! │   Version: u8 (1) | BlockSize: u32 (4)                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Block 0 (BlockSize bytes)                               │
//! │ ┌─────────┬─────────┬─────────┬──────────────┐          │
//! │ │ CRC (4) │ Type (1)│ Len (2) │ Payload      │ ...      │
//! │ └─────────┴─────────┴─────────┴──────────────┘          │
//! │   [zero padding, < 8 bytes, when no chunk fits]         │
//! ├─────────────────────────────────────────────────────────┤
//! │ Block 1 ...                                             │
//! │   (the last block may be partially written)             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. The CRC32 covers type, length and payload.
//! A chunk header never straddles a block boundary, and a stored checksum
//! of `0` marks the end of written data.

mod block;
mod buffer;
mod header;
mod record;

pub use block::Block;
pub use buffer::BlockBuffer;
pub use header::FileHeader;
pub use record::{
    checksum, decode, encode, peek_checksum, peek_length, peek_type, ChunkType, RecordSource,
};

// =============================================================================
// Shared Constants
// =============================================================================

/// Only supported file format version
pub const FORMAT_VERSION: u8 = 1;

/// File header size: Version (1) + BlockSize (4) = 5 bytes
pub const FILE_HEADER_SIZE: usize = 5;

/// Chunk checksum field size
pub const CHECKSUM_SIZE: usize = 4;

/// Chunk header size: Checksum (4) + Type (1) + Length (2) = 7 bytes
pub const CHUNK_HEADER_SIZE: usize = 7;

/// Largest block whose chunks still fit a 16-bit payload length
pub const MAX_BLOCK_SIZE: usize = CHUNK_HEADER_SIZE + u16::MAX as usize;
