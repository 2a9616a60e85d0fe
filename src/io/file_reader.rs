//! Byte sources backed by local files and in-memory buffers.
//!
//! `FileReader` is the standard source for on-disk slides. The OS file
//! handle carries a cursor, so a mutex serialises the `seek` + `read` pair;
//! the lock is held for exactly that window and never across decompression,
//! which lets concurrent section decodes overlap their CPU work.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use bytes::Bytes;

use crate::error::IoError;

use super::range_reader::RangeReader;

/// A random-access byte source over a local file.
///
/// Owns the OS handle; the handle is released when the reader is dropped.
pub struct FileReader {
    file: Mutex<fs::File>,
    size: u64,
    identifier: String,
}

impl FileReader {
    /// Open a file for positional reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let size = file.metadata()?.len();

        Ok(FileReader {
            file: Mutex::new(file),
            size,
            identifier: path.display().to_string(),
        })
    }
}

impl RangeReader for FileReader {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size,
            })?;
        if end > self.size {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size,
            });
        }

        let mut buf = vec![0u8; len];
        {
            // Lock scope covers only the seek + read pair.
            let mut file = self.file.lock().expect("file mutex poisoned");
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf)?;
        }

        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// A byte source over an in-memory buffer.
///
/// Used by tests and by callers that already hold the container bytes.
pub struct MemoryReader {
    data: Bytes,
    identifier: String,
}

impl MemoryReader {
    /// Wrap a byte buffer.
    pub fn new(data: impl Into<Bytes>) -> Self {
        MemoryReader {
            data: data.into(),
            identifier: "memory://buffer".to_string(),
        }
    }
}

impl RangeReader for MemoryReader {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let start = offset as usize;
        let end = start.checked_add(len).filter(|&e| e <= self.data.len());

        match end {
            Some(end) => Ok(self.data.slice(start..end)),
            None => Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.data.len() as u64,
            }),
        }
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
