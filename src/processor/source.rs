use memmap2::Mmap;
use std::{fs::File, io::Read, ops::Deref, path::Path};
use tracing::debug;

use crate::processor::ProcessorError;

/// Read-only view of the whole input. Shared by all workers without locking.
#[derive(Debug)]
pub enum ByteSource {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl ByteSource {
    /// Memory-maps `path`.
    ///
    /// Empty files are not mapped (some platforms reject zero-length maps).
    pub fn map(path: &Path) -> Result<Self, ProcessorError> {
        let file = File::open(path).map_err(|e| ProcessorError::io(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| ProcessorError::io(path, e))?
            .len();

        if len == 0 {
            return Ok(ByteSource::Owned(Vec::new()));
        }

        // SAFETY: the map is read-only; the file must not be modified while mapped.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| ProcessorError::io(path, e))?;
        debug!(path = %path.display(), bytes = mmap.len(), "mapped input");
        Ok(ByteSource::Mapped(mmap))
    }

    /// Reads `path` fully into memory.
    ///
    /// # Errors
    /// [`ProcessorError::Truncated`] if fewer bytes arrive than the file
    /// metadata reported.
    pub fn read(path: &Path) -> Result<Self, ProcessorError> {
        let mut file = File::open(path).map_err(|e| ProcessorError::io(path, e))?;
        let expected = file
            .metadata()
            .map_err(|e| ProcessorError::io(path, e))?
            .len();

        let mut buf = Vec::with_capacity(expected as usize);
        file.read_to_end(&mut buf)
            .map_err(|e| ProcessorError::io(path, e))?;

        Self::check_len(expected, buf.len() as u64)?;
        debug!(path = %path.display(), bytes = buf.len(), "read input");
        Ok(ByteSource::Owned(buf))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ByteSource::Owned(bytes.into())
    }

    fn check_len(expected: u64, actual: u64) -> Result<(), ProcessorError> {
        if actual < expected {
            return Err(ProcessorError::Truncated { expected, actual });
        }
        Ok(())
    }
}

impl Deref for ByteSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            ByteSource::Mapped(mmap) => &mmap[..],
            ByteSource::Owned(buf) => &buf[..],
        }
    }
}
