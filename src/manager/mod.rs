//! Manager Module
//!
//! Serves many log files from one root directory under two bounds.
//!
//! ## Responsibilities
//! - Keep at most `permits.write` write handles open, closing the least
//!   recently appended one on overflow
//! - Run at most `permits.read` scans concurrently
//! - Share one block buffer pool across all files

mod cache;
mod log_files;
mod permits;

pub use cache::HandleCache;
pub use log_files::LogFilesManager;
pub use permits::{PermitGuard, Permits};
