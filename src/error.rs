//! Error types for blocklog
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Checksum mismatch on a single chunk.
///
/// This is the only recoverable read condition: it is handed to a
/// [`CorruptionHandler`](crate::log::CorruptionHandler), which decides
/// whether the scan goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected checksum ({expected_checksum}) doesn't equal to calculated ({calculated_checksum})")]
pub struct RecordCorrupted {
    /// Checksum stored in the chunk header
    pub expected_checksum: u32,

    /// Checksum recomputed over the chunk as read
    pub calculated_checksum: u32,
}

/// Unified error type for blocklog operations
#[derive(Debug, Error)]
pub enum LogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported log file version {version}")]
    UnsupportedVersion { version: u8 },

    #[error("Invalid file's header: {0}")]
    InvalidHeader(String),

    #[error("Record corrupted: {0}")]
    RecordCorrupted(#[from] RecordCorrupted),

    // -------------------------------------------------------------------------
    // Read Errors
    // -------------------------------------------------------------------------
    #[error("Unexpected end of file {}", path.display())]
    UnexpectedEndOfFile { path: PathBuf },

    #[error("Log file {} was appended to during the read", path.display())]
    ConcurrentModification { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
