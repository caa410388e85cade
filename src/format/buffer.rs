//! Block cursor buffer
//!
//! A fixed-capacity byte buffer with a read cursor and a write cursor,
//! `0 <= reader_index <= writer_index <= capacity`.

use std::fmt;
use std::io::{self, ErrorKind, Read, Write};

use crate::pool::PooledBuffer;

/// Fixed-capacity buffer holding the bytes of one block
pub struct BlockBuffer {
    bytes: PooledBuffer,
    reader_index: usize,
    writer_index: usize,
}

impl BlockBuffer {
    /// Wrap a pooled buffer; capacity is the buffer's length
    pub fn new(bytes: PooledBuffer) -> Self {
        Self {
            bytes,
            reader_index: 0,
            writer_index: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn reader_index(&self) -> usize {
        self.reader_index
    }

    pub fn writer_index(&self) -> usize {
        self.writer_index
    }

    pub fn readable_bytes(&self) -> usize {
        self.writer_index - self.reader_index
    }

    pub fn writable_bytes(&self) -> usize {
        self.capacity() - self.writer_index
    }

    pub fn is_readable(&self, count: usize) -> bool {
        self.readable_bytes() >= count
    }

    pub fn is_writable(&self, count: usize) -> bool {
        self.writable_bytes() >= count
    }

    /// Bytes between the two cursors
    pub fn readable(&self) -> &[u8] {
        &self.bytes[self.reader_index..self.writer_index]
    }

    /// Everything written so far, from offset 0
    pub fn written(&self) -> &[u8] {
        &self.bytes[..self.writer_index]
    }

    /// Unwritten tail of the buffer
    pub fn writable_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[self.writer_index..]
    }

    pub fn advance_reader(&mut self, count: usize) {
        debug_assert!(self.reader_index + count <= self.writer_index);
        self.reader_index += count;
    }

    pub fn advance_writer(&mut self, count: usize) {
        debug_assert!(self.writer_index + count <= self.capacity());
        self.writer_index += count;
    }

    /// Move both cursors to `offset`
    pub fn seek(&mut self, offset: usize) {
        debug_assert!(offset <= self.capacity());
        self.reader_index = offset;
        self.writer_index = offset;
    }

    pub fn reset(&mut self) {
        self.seek(0);
    }

    /// Zero the unwritten tail and mark it written
    pub fn zero_fill_remaining(&mut self) {
        self.writable_mut().fill(0);
        self.writer_index = self.capacity();
    }

    /// Read from `source` until the buffer is full or the source is exhausted
    pub fn fill_from<R: Read>(&mut self, source: &mut R) -> io::Result<usize> {
        let mut total = 0;
        while self.writer_index < self.capacity() {
            match source.read(&mut self.bytes[self.writer_index..]) {
                Ok(0) => break,
                Ok(n) => {
                    self.writer_index += n;
                    total += n;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    /// Write the readable bytes to `sink` and consume them
    pub fn drain_to<W: Write>(&mut self, sink: &mut W) -> io::Result<usize> {
        let count = self.readable_bytes();
        sink.write_all(&self.bytes[self.reader_index..self.writer_index])?;
        self.reader_index = self.writer_index;
        Ok(count)
    }
}

impl fmt::Debug for BlockBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockBuffer")
            .field("capacity", &self.capacity())
            .field("reader_index", &self.reader_index)
            .field("writer_index", &self.writer_index)
            .finish()
    }
}
