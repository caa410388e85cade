//! # blocklog
//!
//! A single-writer, block-chunked, checksummed append log with:
//! - Fixed-size blocks and CRC32-framed chunks for torn-write detection
//! - O(1) resume of appends after a restart
//! - Corruption recovery through a caller-supplied policy
//! - A multi-file manager bounding open write handles and concurrent reads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LogFilesManager                          │
//! │     (LRU write handles · read permits · buffer pool)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  per path
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       LogFile                               │
//! │            (modification counter · lazy appender)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Appender   │          │   Reader    │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │ Block / Codec │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod format;
pub mod log;
pub mod manager;
pub mod pool;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LogError, RecordCorrupted, Result};
pub use config::{Config, ManagerConfig};
pub use log::{CorruptionHandler, LogAndContinue, LogAndStop, LogFile, RecordConsumer};
pub use manager::LogFilesManager;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blocklog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
