//! Log Files Manager
//!
//! Routes appends and loads by relative path to per-file log handles.

use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::ManagerConfig;
use crate::error::{LogError, Result};
use crate::log::{CorruptionHandler, LogAndContinue, LogFile, RecordConsumer};
use crate::pool::BufferPool;

use super::{HandleCache, Permits};

/// Multiplexes many log files under a root directory
///
/// ## Concurrency:
/// - `write_handles`: one Mutex serializes every append across all paths,
///   keeping the LRU order and lazy appender creation race-free
/// - `read_permits`: at most `permits.read` scans run at once, each on its
///   own transient handle and file descriptor
/// - `modifications`: one counter per path, shared by the cached write
///   handle and every transient read handle of that path, so a scan notices
///   appends made through the manager. Entries are removed once no handle
///   holds them.
/// - `pool`: block buffers shared by all handles
pub struct LogFilesManager {
    config: ManagerConfig,
    write_handles: Mutex<HandleCache>,
    read_permits: Permits,
    modifications: Mutex<HashMap<PathBuf, Arc<AtomicU64>>>,
    pool: BufferPool,
}

impl LogFilesManager {
    /// Create the manager, creating its root directory if needed
    pub fn new(config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.directory)?;

        let capacity = NonZeroUsize::new(config.permits.write)
            .ok_or_else(|| LogError::Config("write permits must be positive".to_string()))?;
        let pool = BufferPool::new(
            config.common.block_size,
            config.pool.initial_buffers,
            config.pool.maximum_buffers,
        );

        Ok(Self {
            write_handles: Mutex::new(HandleCache::new(capacity)),
            read_permits: Permits::new(config.permits.read),
            modifications: Mutex::new(HashMap::new()),
            pool,
            config,
        })
    }

    /// Append a record to the file at `path` (relative to the root
    /// directory). Returns the file position after the write.
    ///
    /// Opens a write handle on first use. When the cache is full, the least
    /// recently appended handle is closed first; if that close fails, the
    /// record is not written.
    pub fn append(&self, path: impl AsRef<Path>, record: &[u8]) -> Result<u64> {
        let path = path.as_ref();
        let mut handles = self.write_handles.lock();

        if let Some(log_file) = handles.get(path) {
            return log_file.append(record);
        }

        if let Some((evicted_path, evicted)) = handles.evict_if_full() {
            tracing::debug!("Evicting write handle {}", evicted_path.display());
            let closed = evicted.close();
            self.release(&evicted_path, evicted);
            closed?;
        }

        let log_file = self.create_log_file(path);
        match log_file.append(record) {
            Ok(position) => {
                let displaced = handles.insert(path.to_path_buf(), log_file);
                debug_assert!(displaced.is_none());
                Ok(position)
            }
            Err(e) => {
                self.release(path, log_file);
                Err(e)
            }
        }
    }

    /// Read every record of the file at `path`, logging and skipping
    /// corrupted ones
    pub fn load<C>(&self, path: impl AsRef<Path>, consumer: C) -> Result<Option<u64>>
    where
        C: RecordConsumer,
    {
        self.load_with(path, consumer, LogAndContinue)
    }

    /// Read every record of the file at `path`.
    ///
    /// Blocks until a read permit is free; the permit is returned however
    /// the scan ends.
    pub fn load_with<C, H>(&self, path: impl AsRef<Path>, consumer: C, handler: H) -> Result<Option<u64>>
    where
        C: RecordConsumer,
        H: CorruptionHandler,
    {
        let _permit = self.read_permits.acquire();

        let path = path.as_ref();
        let log_file = self.create_log_file(path);
        let result = log_file.load_with(consumer, handler);
        let closed = log_file.close();
        self.release(path, log_file);
        closed?;
        result
    }

    /// Close every cached write handle
    pub fn close(&self) -> Result<()> {
        let drained = self.write_handles.lock().drain();
        tracing::debug!("Closing {} write handles", drained.len());

        let mut first_error = None;
        for (path, log_file) in drained {
            if let Err(e) = log_file.close() {
                tracing::error!("Failed to close {}: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
            self.release(&path, log_file);
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Whether a write handle for `path` is currently cached
    pub fn is_open(&self, path: impl AsRef<Path>) -> bool {
        self.write_handles.lock().contains(path.as_ref())
    }

    /// Number of cached write handles
    pub fn open_handles(&self) -> usize {
        self.write_handles.lock().len()
    }

    /// Number of paths with a live modification counter. Only paths with a
    /// cached write handle or a scan in progress keep one.
    pub fn tracked_paths(&self) -> usize {
        self.modifications.lock().len()
    }

    pub fn available_read_permits(&self) -> usize {
        self.read_permits.available()
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn create_log_file(&self, path: &Path) -> LogFile {
        let modifications = Arc::clone(
            self.modifications
                .lock()
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(AtomicU64::new(0))),
        );
        LogFile::with_pool(self.config.file_config(path), self.pool.clone(), modifications)
    }

    /// Drop a handle, forgetting its path's counter once no other handle
    /// shares it
    fn release(&self, path: &Path, log_file: LogFile) {
        drop(log_file);

        let mut modifications = self.modifications.lock();
        if modifications
            .get(path)
            .is_some_and(|counter| Arc::strong_count(counter) == 1)
        {
            modifications.remove(path);
        }
    }
}
