//! In-memory log source

use std::io;
use std::sync::RwLock;

use super::{Fingerprint, LogSource, SourceId};

struct Contents {
    bytes: Vec<u8>,
    generation: u64,
}

/// Log held in memory, mutated explicitly
///
/// Useful for embedding and for exercising rotation and truncation without a
/// filesystem. Truncation and rotation bump the generation, which is reported
/// as the fingerprint identity.
pub struct MemorySource {
    id: SourceId,
    contents: RwLock<Contents>,
}

impl MemorySource {
    pub fn new(id: impl Into<SourceId>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            contents: RwLock::new(Contents {
                bytes: bytes.into(),
                generation: 0,
            }),
        }
    }

    pub fn empty(id: impl Into<SourceId>) -> Self {
        Self::new(id, Vec::new())
    }

    /// Appends bytes; the identity is unchanged
    pub fn append(&self, bytes: &[u8]) -> io::Result<()> {
        let mut contents = self.write()?;
        contents.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Cuts the source down to `len` bytes
    pub fn truncate(&self, len: u64) -> io::Result<()> {
        let mut contents = self.write()?;
        contents.bytes.truncate(len as usize);
        contents.generation += 1;
        Ok(())
    }

    /// Replaces the whole content, as if the log had been rotated
    pub fn rotate(&self, bytes: impl Into<Vec<u8>>) -> io::Result<()> {
        let mut contents = self.write()?;
        contents.bytes = bytes.into();
        contents.generation += 1;
        Ok(())
    }

    fn write(&self) -> io::Result<std::sync::RwLockWriteGuard<'_, Contents>> {
        self.contents
            .write()
            .map_err(|_| io::Error::other("Failed to lock memory source"))
    }

    fn read(&self) -> io::Result<std::sync::RwLockReadGuard<'_, Contents>> {
        self.contents
            .read()
            .map_err(|_| io::Error::other("Failed to lock memory source"))
    }
}

impl LogSource for MemorySource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn fingerprint(&self) -> io::Result<Fingerprint> {
        let contents = self.read()?;
        Ok(Fingerprint::new(
            contents.bytes.len() as u64,
            contents.generation,
        ))
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let contents = self.read()?;
        let len = contents.bytes.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(contents.bytes.len() - start);
        buf[..n].copy_from_slice(&contents.bytes[start..start + n]);
        Ok(n)
    }
}
