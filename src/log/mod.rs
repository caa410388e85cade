//! Log Module
//!
//! Append and scan a single block-chunked log file.
//!
//! ## Responsibilities
//! - Split records into FULL / FIRST / MIDDLE / LAST chunks on append
//! - Resume appends after a restart without rescanning the file
//! - Reassemble records on read, resynchronizing after corrupted chunks
//! - Fail fast when a scan overlaps an append to the same handle

mod appender;
mod file;
mod handler;
mod reader;

pub use appender::Appender;
pub use file::LogFile;
pub use handler::{CorruptionHandler, LogAndContinue, LogAndStop, RecordConsumer};
pub use reader::Reader;
