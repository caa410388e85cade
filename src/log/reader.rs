//! Reader
//!
//! Reassembles logical records from the chunk stream of a log file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::BytesMut;

use crate::config::Config;
use crate::error::{LogError, Result};
use crate::format::{Block, ChunkType, FileHeader, FILE_HEADER_SIZE};
use crate::pool::BufferPool;

use super::{CorruptionHandler, RecordConsumer};

/// Scans a log file from its first block.
///
/// Reads are not locked against appends to the same file. Instead the scan
/// compares the owning handle's modification counter before each record and
/// fails with `ConcurrentModification` as soon as it moves.
pub struct Reader {
    path: PathBuf,
    block: Block,
    record: BytesMut,
    modifications: Arc<AtomicU64>,
}

impl Reader {
    /// Prepare a scan of `config.path`, creating the file (header only) if
    /// it does not exist yet.
    pub fn open(config: &Config, pool: &BufferPool, modifications: Arc<AtomicU64>) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&config.path)?;

        let block_size = if file.metadata()?.len() == 0 {
            config.validate()?;
            FileHeader::new(config.block_size as u32).write_to(&mut file)?;
            config.block_size
        } else {
            FileHeader::read_from(&mut file)?.block_size()
        };

        Ok(Self {
            path: config.path.clone(),
            block: Block::new(pool.acquire_with_size(block_size)),
            record: BytesMut::new(),
            modifications,
        })
    }

    /// Feed every record to `consumer`, in file order.
    ///
    /// Returns the file position the scan stopped at, or `None` if the file
    /// no longer exists. I/O failures are reported as `ReadFailure`.
    pub fn read<C, H>(&mut self, consumer: &mut C, handler: &mut H) -> Result<Option<u64>>
    where
        C: RecordConsumer + ?Sized,
        H: CorruptionHandler + ?Sized,
    {
        if !self.path.exists() {
            return Ok(None);
        }

        self.read_all(consumer, handler)
            .map(Some)
            .map_err(|e| match e {
                LogError::Io(source) => LogError::ReadFailure {
                    path: self.path.clone(),
                    source,
                },
                other => other,
            })
    }

    fn read_all<C, H>(&mut self, consumer: &mut C, handler: &mut H) -> Result<u64>
    where
        C: RecordConsumer + ?Sized,
        H: CorruptionHandler + ?Sized,
    {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(FILE_HEADER_SIZE as u64))?;

        let expected = self.modifications.load(Ordering::Acquire);
        while self.block.has_content() || self.block.load_next(&mut file)? {
            if self.modifications.load(Ordering::Acquire) != expected {
                return Err(LogError::ConcurrentModification {
                    path: self.path.clone(),
                });
            }
            if !self.read_record(&mut file, handler)? {
                break;
            }
            if !consumer.consume(&self.record, file.stream_position()?) {
                break;
            }
            self.record.clear();
        }
        Ok(file.stream_position()?)
    }

    /// Pull chunks until a record is complete. `false` means no complete
    /// record remains (or the handler asked to stop).
    fn read_record<H>(&mut self, file: &mut File, handler: &mut H) -> Result<bool>
    where
        H: CorruptionHandler + ?Sized,
    {
        let mut in_fragment = false;
        loop {
            if !self.block.has_content() && !self.block.load_next(file)? {
                return Err(LogError::UnexpectedEndOfFile {
                    path: self.path.clone(),
                });
            }

            let stale = self.record.len();
            match self.block.read(&mut self.record) {
                Ok(ChunkType::Undefined) => return Ok(false),
                Ok(chunk @ ChunkType::Full) | Ok(chunk @ ChunkType::First) => {
                    if in_fragment {
                        self.drop_fragment(stale, file)?;
                    }
                    if chunk == ChunkType::Full {
                        return Ok(true);
                    }
                    in_fragment = true;
                }
                Ok(ChunkType::Middle) | Ok(ChunkType::Last) if !in_fragment => {
                    // Continuation of a record whose start was never seen
                    self.drop_fragment(self.record.len(), file)?;
                }
                Ok(ChunkType::Middle) => {}
                Ok(ChunkType::Last) => return Ok(true),
                Err(corrupted) => {
                    if !handler.handle(&corrupted) {
                        return Ok(false);
                    }
                    self.record.clear();
                    in_fragment = false;
                    if !self.move_to_next_record(file)? {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// Discard the first `len` bytes of the record being assembled. They
    /// belong to a record cut short by a crash, and the appender resumed
    /// after it.
    fn drop_fragment(&mut self, len: usize, file: &mut File) -> Result<()> {
        tracing::warn!(
            "Dropping {} bytes of an unfinished record in {} before {}",
            len,
            self.path.display(),
            file.stream_position()?
        );
        let _ = self.record.split_to(len);
        Ok(())
    }

    /// Skip to the first FIRST or FULL chunk of a following block
    fn move_to_next_record(&mut self, file: &mut File) -> Result<bool> {
        loop {
            if !self.block.load_next(file)? {
                return Ok(false);
            }
            tracing::trace!(
                "Resynchronizing {} at {}",
                self.path.display(),
                file.stream_position()?
            );
            if self.block.move_to(&[ChunkType::First, ChunkType::Full]) {
                return Ok(true);
            }
        }
    }
}
