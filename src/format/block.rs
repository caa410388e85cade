//! Block
//!
//! One block-sized span of the file. Decides which chunk type a write
//! produces, keeps chunk headers from straddling block boundaries, and moves
//! block contents to and from the file.

use std::fmt;
use std::fs::File;
use std::io::{self, Seek, SeekFrom};

use bytes::BytesMut;

use crate::error::RecordCorrupted;
use crate::pool::PooledBuffer;

use super::record::{self, ChunkType, RecordSource};
use super::{BlockBuffer, CHUNK_HEADER_SIZE};

/// Fixed-capacity buffer representing exactly one on-disk block
pub struct Block {
    buffer: BlockBuffer,
}

impl Block {
    pub fn new(bytes: PooledBuffer) -> Self {
        Self {
            buffer: BlockBuffer::new(bytes),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn buffer(&self) -> &BlockBuffer {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.reset();
    }

    /// Position both cursors at `offset` within the block
    pub fn seek(&mut self, offset: usize) {
        self.buffer.seek(offset);
    }

    /// Frame the next chunk of `record` into this block.
    ///
    /// Returns `true` while the record still has bytes to write; the caller
    /// flushes and calls again with the same record. A full block is reset
    /// and reported as "retry" without consuming anything.
    pub fn write(&mut self, record: &mut RecordSource<'_>) -> bool {
        if self.buffer.writable_bytes() == 0 {
            self.buffer.reset();
            return true;
        }

        let is_first_or_full = record.position() == 0;
        let is_fully_fit = self.buffer.is_writable(CHUNK_HEADER_SIZE + record.remaining());

        let chunk_type = match (is_first_or_full, is_fully_fit) {
            (true, true) => ChunkType::Full,
            (true, false) => ChunkType::First,
            (false, true) => ChunkType::Last,
            (false, false) => ChunkType::Middle,
        };

        record::encode(&mut self.buffer, chunk_type, record);
        self.align();
        record.has_remaining()
    }

    /// Decode the next chunk into `destination`
    pub fn read(&mut self, destination: &mut BytesMut) -> Result<ChunkType, RecordCorrupted> {
        record::decode(destination, &mut self.buffer)
    }

    /// Write the unflushed bytes at the file's current position; a full
    /// block is reset for the next one.
    pub fn flush(&mut self, file: &mut File) -> io::Result<()> {
        self.buffer.drain_to(file)?;
        if self.buffer.writable_bytes() == 0 {
            self.buffer.reset();
        }
        Ok(())
    }

    /// Load the next block from `file`.
    ///
    /// A fresh block reads from the current position. Otherwise the file is
    /// first advanced past the rest of the current block, so reads stay on the
    /// block grid. Returns `false` when there is nothing more to read.
    pub fn load_next(&mut self, file: &mut File) -> io::Result<bool> {
        if self.buffer.reader_index() == 0 && self.buffer.writer_index() == 0 {
            return Ok(self.buffer.fill_from(file)? > 0);
        }

        let next_block = file.stream_position()? + self.buffer.writable_bytes() as u64;
        if next_block >= file.metadata()?.len() {
            return Ok(false);
        }
        file.seek(SeekFrom::Start(next_block))?;

        self.buffer.reset();
        Ok(self.buffer.fill_from(file)? > 0)
    }

    /// Skip chunks in the current block until one of `types` is at the read
    /// cursor. Gives up on `Undefined` or on a chunk truncated by the end of
    /// the loaded data.
    pub fn move_to(&mut self, types: &[ChunkType]) -> bool {
        loop {
            let chunk_type = record::peek_type(&self.buffer);
            if types.contains(&chunk_type) {
                return true;
            }
            if chunk_type == ChunkType::Undefined {
                return false;
            }

            let chunk_length = CHUNK_HEADER_SIZE + record::peek_length(&self.buffer) as usize;
            if !self.buffer.is_readable(chunk_length) {
                return false;
            }
            self.buffer.advance_reader(chunk_length);
        }
    }

    /// At least one chunk header and one payload byte are readable. A
    /// zero-length chunk at the very end of the data does not qualify.
    pub fn has_content(&self) -> bool {
        self.buffer.is_readable(CHUNK_HEADER_SIZE + 1)
    }

    /// Zero-fill the tail when it cannot hold a chunk with payload
    pub fn align(&mut self) {
        if self.buffer.writable_bytes() > CHUNK_HEADER_SIZE {
            return;
        }
        self.buffer.zero_fill_remaining();
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block").field("buffer", &self.buffer).finish()
    }
}
