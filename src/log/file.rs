//! Log Handle
//!
//! Per-path handle composing a lazily opened appender, a modification
//! counter, and reader construction.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::pool::BufferPool;

use super::{Appender, CorruptionHandler, LogAndContinue, Reader, RecordConsumer};

/// Max idle buffers kept by the private pool of a stand-alone log file
const STANDALONE_POOL_BUFFERS: usize = 16;

/// Write side of a handle: nothing is opened until the first append
enum WriterState {
    Unopened,
    Open(Appender),
}

/// A single log file supporting two operations: appending a record, and
/// reading all records from the beginning.
///
/// ## Concurrency:
/// - `writer`: Mutex, appends to one handle are serialized
/// - `modifications`: atomic counter bumped by every append that opened
///   the file; scans in progress compare against it and fail fast instead
///   of locking
/// - All methods use `&self`
pub struct LogFile {
    config: Config,
    modifications: Arc<AtomicU64>,
    pool: BufferPool,
    writer: Mutex<WriterState>,
}

impl LogFile {
    /// Stand-alone log file with its own small buffer pool
    pub fn new(config: Config) -> Self {
        let pool = BufferPool::new(config.block_size, 1, STANDALONE_POOL_BUFFERS);
        Self::with_pool(config, pool, Arc::new(AtomicU64::new(0)))
    }

    /// Handle sharing `pool` and the modification counter with other
    /// handles of the same path
    pub(crate) fn with_pool(config: Config, pool: BufferPool, modifications: Arc<AtomicU64>) -> Self {
        Self {
            config,
            modifications,
            pool,
            writer: Mutex::new(WriterState::Unopened),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// File size in bytes
    pub fn size(&self) -> Result<u64> {
        Ok(fs::metadata(&self.config.path)?.len())
    }

    /// Number of appends that reached the file through handles sharing this
    /// counter. An append whose file could not be opened is not counted.
    pub fn modification_count(&self) -> u64 {
        self.modifications.load(Ordering::Acquire)
    }

    /// Whether the write side has been opened
    pub fn is_open(&self) -> bool {
        matches!(*self.writer.lock(), WriterState::Open(_))
    }

    /// Append a record. Returns the file position after the write.
    ///
    /// Empty records are stored, but a scan only returns one once another
    /// record follows it: a zero-length record at the very end of the file
    /// is not read back.
    pub fn append(&self, record: &[u8]) -> Result<u64> {
        let mut writer = self.writer.lock();
        if let WriterState::Open(appender) = &mut *writer {
            return self.write(appender, record);
        }

        let mut appender = Appender::open(&self.config, &self.pool)?;
        let position = self.write(&mut appender, record);
        *writer = WriterState::Open(appender);
        position
    }

    /// Read all records from the file's beginning, logging and skipping
    /// corrupted ones
    pub fn load<C>(&self, consumer: C) -> Result<Option<u64>>
    where
        C: RecordConsumer,
    {
        self.load_with(consumer, LogAndContinue)
    }

    /// Read all records from the file's beginning.
    ///
    /// Corrupted chunks go to `handler`; every other failure ends the scan
    /// with an error. Returns the position the scan stopped at, or `None`
    /// if the file does not exist.
    pub fn load_with<C, H>(&self, mut consumer: C, mut handler: H) -> Result<Option<u64>>
    where
        C: RecordConsumer,
        H: CorruptionHandler,
    {
        let mut reader = Reader::open(&self.config, &self.pool, Arc::clone(&self.modifications))?;
        reader.read(&mut consumer, &mut handler)
    }

    /// Bumped before the first chunk is written, so a scan that can see any
    /// part of the record also sees the new count
    fn write(&self, appender: &mut Appender, record: &[u8]) -> Result<u64> {
        self.modifications.fetch_add(1, Ordering::AcqRel);
        appender.append(record)
    }

    /// Close the write side, if it was ever opened. A later append reopens it.
    pub fn close(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        match std::mem::replace(&mut *writer, WriterState::Unopened) {
            WriterState::Open(appender) => appender.close(),
            WriterState::Unopened => Ok(()),
        }
    }

    /// Remove every record, if the write side was ever opened
    pub fn clear(&self) -> Result<()> {
        match &mut *self.writer.lock() {
            WriterState::Open(appender) => appender.reset(),
            WriterState::Unopened => Ok(()),
        }
    }
}
