//! Write-handle cache
//!
//! LRU-ordered map of open write handles. Evicted handles are handed back to
//! the caller, which is responsible for closing them.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use lru::LruCache;

use crate::log::LogFile;

pub struct HandleCache {
    entries: LruCache<PathBuf, LogFile>,
}

impl HandleCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up a handle, marking it most recently used
    pub fn get(&mut self, path: &Path) -> Option<&LogFile> {
        self.entries.get(path)
    }

    /// Insert a handle as most recently used.
    ///
    /// Returns the entry pushed out: the least recently used one when the
    /// cache was full, or a previous handle for the same path.
    pub fn insert(&mut self, path: PathBuf, handle: LogFile) -> Option<(PathBuf, LogFile)> {
        self.entries.push(path, handle)
    }

    /// Make room for one more handle. When the cache is full, removes and
    /// returns the least recently used entry.
    pub fn evict_if_full(&mut self) -> Option<(PathBuf, LogFile)> {
        if self.entries.len() < self.capacity() {
            return None;
        }
        self.entries.pop_lru()
    }

    /// Membership test that does not touch the LRU order
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Remove every handle, least recently used first
    pub fn drain(&mut self) -> Vec<(PathBuf, LogFile)> {
        let mut drained = Vec::with_capacity(self.entries.len());
        while let Some(entry) = self.entries.pop_lru() {
            drained.push(entry);
        }
        drained
    }
}
