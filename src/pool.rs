//! Block Buffer Pool
//!
//! Pool of reusable, fixed-capacity byte buffers shared by every appender and
//! reader of a manager, amortizing block allocation across files.
//!
//! A buffer is handed out as a [`PooledBuffer`] guard which gives the memory
//! back to the pool when dropped, whatever path the owner leaves by.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crossbeam::queue::ArrayQueue;

/// Lock-free pool of block buffers. Cloning shares the same pool.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    /// Idle buffers; bounded so a burst of readers cannot pin memory forever
    idle: ArrayQueue<Vec<u8>>,

    /// Capacity of buffers handed out by `acquire`
    buffer_size: usize,
}

impl BufferPool {
    /// Create a pool of `buffer_size`-byte buffers, pre-allocating
    /// `initial_buffers` and retaining at most `maximum_buffers` idle ones.
    pub fn new(buffer_size: usize, initial_buffers: usize, maximum_buffers: usize) -> Self {
        let idle = ArrayQueue::new(maximum_buffers.max(1));
        for _ in 0..initial_buffers.min(idle.capacity()) {
            // Cannot fail: bounded by the queue capacity above
            let _ = idle.push(vec![0u8; buffer_size]);
        }

        Self {
            inner: Arc::new(PoolInner { idle, buffer_size }),
        }
    }

    /// Default capacity of buffers handed out by this pool
    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size
    }

    /// Number of buffers currently parked in the pool
    pub fn idle_buffers(&self) -> usize {
        self.inner.idle.len()
    }

    /// Acquire a zero-filled buffer of the pool's default size
    pub fn acquire(&self) -> PooledBuffer {
        self.acquire_with_size(self.inner.buffer_size)
    }

    /// Acquire a zero-filled buffer of exactly `size` bytes.
    ///
    /// Files created with another block size than the pool's default still
    /// reuse pooled allocations; the buffer is resized in place.
    pub fn acquire_with_size(&self, size: usize) -> PooledBuffer {
        let mut bytes = self.inner.idle.pop().unwrap_or_default();
        bytes.clear();
        bytes.resize(size, 0);

        PooledBuffer {
            bytes,
            pool: self.clone(),
        }
    }

    fn release(&self, buffer: Vec<u8>) {
        // A full pool drops the buffer
        let _ = self.inner.idle.push(buffer);
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_size", &self.inner.buffer_size)
            .field("idle", &self.inner.idle.len())
            .field("maximum", &self.inner.idle.capacity())
            .finish()
    }
}

/// A buffer borrowed from a [`BufferPool`]; returned to it on drop.
pub struct PooledBuffer {
    bytes: Vec<u8>,
    pool: BufferPool,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.bytes));
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.bytes.len())
            .finish()
    }
}
