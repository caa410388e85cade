//! Configuration for blocklog
//!
//! Plain value objects with sensible defaults, one for a single log file and
//! one for the multi-file manager.

use std::path::{Path, PathBuf};

use crate::error::{LogError, Result};
use crate::format::{CHUNK_HEADER_SIZE, MAX_BLOCK_SIZE};

/// Default block size: 32 KiB
pub const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

/// Configuration of a single log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path to the log file
    pub path: PathBuf,

    /// Size of one on-disk block, in bytes.
    ///
    /// Only used when the file is created; an existing file keeps the block
    /// size recorded in its header.
    pub block_size: usize,

    /// fsync the file after every chunk written by `append`
    pub force_flush: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./file.log"),
            block_size: DEFAULT_BLOCK_SIZE,
            force_flush: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Copy of this config pointing at another file
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }

    /// Check that the block size can frame at least one payload byte and
    /// that no chunk payload can overflow the 16-bit length field.
    pub fn validate(&self) -> Result<()> {
        validate_block_size(self.block_size)
    }
}

pub(crate) fn validate_block_size(block_size: usize) -> Result<()> {
    if block_size <= CHUNK_HEADER_SIZE {
        return Err(LogError::Config(format!(
            "block size {} must be greater than the chunk header size {}",
            block_size, CHUNK_HEADER_SIZE
        )));
    }
    if block_size > MAX_BLOCK_SIZE {
        return Err(LogError::Config(format!(
            "block size {} exceeds the maximum {}",
            block_size, MAX_BLOCK_SIZE
        )));
    }
    Ok(())
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    /// Enable or disable fsync after every written chunk
    pub fn force_flush(mut self, force: bool) -> Self {
        self.config.force_flush = force;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Manager Configuration
// =============================================================================

/// Bounds on concurrently open handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitsConfig {
    /// Max number of write handles kept open (LRU capacity)
    pub write: usize,

    /// Max number of concurrent read scans
    pub read: usize,
}

impl Default for PermitsConfig {
    fn default() -> Self {
        Self { write: 20, read: 20 }
    }
}

/// Sizing of the shared block buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Buffers allocated up front
    pub initial_buffers: usize,

    /// Max number of idle buffers retained by the pool
    pub maximum_buffers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_buffers: 2,
            maximum_buffers: 1_000,
        }
    }
}

/// Configuration of a [`LogFilesManager`](crate::manager::LogFilesManager)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Root directory; paths given to the manager are resolved against it
    pub directory: PathBuf,

    /// Template for every managed file (its `path` is replaced per file)
    pub common: Config,

    pub permits: PermitsConfig,

    pub pool: PoolConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./"),
            common: Config::default(),
            permits: PermitsConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Create a new manager config builder
    pub fn builder() -> ManagerConfigBuilder {
        ManagerConfigBuilder::default()
    }

    /// Config of the file at `relative` under the manager's directory
    pub fn file_config(&self, relative: &Path) -> Config {
        self.common.with_path(self.directory.join(relative))
    }

    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;

        if self.permits.write == 0 {
            return Err(LogError::Config("write permits must be positive".to_string()));
        }
        if self.permits.read == 0 {
            return Err(LogError::Config("read permits must be positive".to_string()));
        }
        if self.pool.initial_buffers > self.pool.maximum_buffers {
            return Err(LogError::Config(format!(
                "initial buffers ({}) exceed maximum buffers ({})",
                self.pool.initial_buffers, self.pool.maximum_buffers
            )));
        }
        Ok(())
    }
}

/// Builder for ManagerConfig
#[derive(Default)]
pub struct ManagerConfigBuilder {
    config: ManagerConfig,
}

impl ManagerConfigBuilder {
    /// Set the root directory
    pub fn directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.directory = path.into();
        self
    }

    /// Set the per-file config template
    pub fn common(mut self, config: Config) -> Self {
        self.config.common = config;
        self
    }

    /// Set the write-handle LRU capacity
    pub fn write_permits(mut self, count: usize) -> Self {
        self.config.permits.write = count;
        self
    }

    /// Set the number of concurrent read scans
    pub fn read_permits(mut self, count: usize) -> Self {
        self.config.permits.read = count;
        self
    }

    /// Set the buffer pool sizing
    pub fn pool(mut self, initial_buffers: usize, maximum_buffers: usize) -> Self {
        self.config.pool = PoolConfig {
            initial_buffers,
            maximum_buffers,
        };
        self
    }

    pub fn build(self) -> ManagerConfig {
        self.config
    }
}
