//! Appender
//!
//! Owns the write handle of one log file and turns logical records into
//! chunk writes.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::format::{Block, FileHeader, RecordSource, FILE_HEADER_SIZE};
use crate::pool::BufferPool;

/// Appends records to a log file.
///
/// Opening an existing file resumes at its end in O(1): the in-memory block
/// is positioned at the offset of the file's tail within its block, without
/// re-reading bytes that are already durable.
pub struct Appender {
    path: PathBuf,
    file: File,
    block: Block,
    force_flush: bool,
}

impl Appender {
    /// Open or create the log file described by `config`
    pub fn open(config: &Config, pool: &BufferPool) -> Result<Self> {
        config.validate()?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&config.path)?;

        let size = file.metadata()?.len();
        let block = if size == 0 {
            FileHeader::new(config.block_size as u32).write_to(&mut file)?;
            tracing::debug!("Created log file {}", config.path.display());
            Block::new(pool.acquire_with_size(config.block_size))
        } else {
            let header = FileHeader::read_from(&mut file)?;
            let mut block = Block::new(pool.acquire_with_size(header.block_size()));

            file.seek(SeekFrom::End(0))?;
            let offset = ((size - FILE_HEADER_SIZE as u64) % header.block_size as u64) as usize;
            block.seek(offset);

            // A torn tail too short for another chunk: pad it out so the
            // next chunk starts on a fresh block.
            if offset > 0 {
                block.align();
                block.flush(&mut file)?;
            }

            tracing::debug!(
                "Resumed log file {} at {} bytes (block offset {})",
                config.path.display(),
                size,
                offset
            );
            block
        };

        Ok(Self {
            path: config.path.clone(),
            file,
            block,
            force_flush: config.force_flush,
        })
    }

    /// Append a record, splitting it across blocks as needed.
    ///
    /// Every chunk is flushed as soon as it is framed. Returns the file
    /// position after the last write.
    pub fn append(&mut self, record: &[u8]) -> Result<u64> {
        let mut source = RecordSource::new(record);
        loop {
            let continue_writing = self.block.write(&mut source);
            self.block.flush(&mut self.file)?;

            if self.force_flush {
                self.file.sync_data()?;
            }
            if !continue_writing {
                break;
            }
        }
        Ok(self.file.stream_position()?)
    }

    /// Drop every record, keeping only the file header
    pub fn reset(&mut self) -> Result<()> {
        self.block.reset();
        self.file.set_len(FILE_HEADER_SIZE as u64)?;
        self.file.seek(SeekFrom::Start(FILE_HEADER_SIZE as u64))?;
        tracing::debug!("Cleared log file {}", self.path.display());
        Ok(())
    }

    /// Flush anything still buffered and release the file handle
    pub fn close(mut self) -> Result<()> {
        self.block.flush(&mut self.file)?;
        if self.force_flush {
            self.file.sync_all()?;
        }
        Ok(())
    }

    pub fn block_size(&self) -> usize {
        self.block.capacity()
    }
}
