//! File Header
//!
//! Fixed 5-byte preamble recording the format version and block size.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use bytes::{Buf, BufMut};

use crate::config::validate_block_size;
use crate::error::{LogError, Result};

use super::{FILE_HEADER_SIZE, FORMAT_VERSION};

/// The header written at offset 0 of every log file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u8,
    pub block_size: u32,
}

impl FileHeader {
    /// Header of a new file with the current format version
    pub fn new(block_size: u32) -> Self {
        Self {
            version: FORMAT_VERSION,
            block_size,
        }
    }

    /// Block size as a buffer capacity
    pub fn block_size(&self) -> usize {
        self.block_size as usize
    }

    pub fn encode(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut bytes = [0u8; FILE_HEADER_SIZE];
        let mut out = &mut bytes[..];
        out.put_u8(self.version);
        out.put_u32(self.block_size);
        bytes
    }

    /// Parse and validate a header.
    ///
    /// A version other than [`FORMAT_VERSION`] is `UnsupportedVersion`; short
    /// input or an unusable block size is `InvalidHeader`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(LogError::InvalidHeader(format!(
                "expected {} bytes, got {}",
                FILE_HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut input = bytes;
        let version = input.get_u8();
        if version != FORMAT_VERSION {
            return Err(LogError::UnsupportedVersion { version });
        }

        let block_size = input.get_u32();
        validate_block_size(block_size as usize)
            .map_err(|_| LogError::InvalidHeader(format!("unusable block size {}", block_size)))?;

        Ok(Self {
            version,
            block_size,
        })
    }

    /// Read the header at offset 0, leaving the file position untouched
    pub fn read_from(file: &mut File) -> Result<Self> {
        let position = file.stream_position()?;
        file.seek(SeekFrom::Start(0))?;

        let mut bytes = [0u8; FILE_HEADER_SIZE];
        let read = file.read_exact(&mut bytes);
        file.seek(SeekFrom::Start(position))?;

        match read {
            Ok(()) => Self::decode(&bytes),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(LogError::InvalidHeader(
                "file is shorter than the header".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the header at offset 0, leaving the file position untouched
    pub fn write_to(&self, file: &mut File) -> Result<()> {
        let position = file.stream_position()?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&self.encode())?;
        if position != 0 {
            file.seek(SeekFrom::Start(position))?;
        }
        Ok(())
    }
}
