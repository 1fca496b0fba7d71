//! Filesystem-backed log source

use std::fs::{File, Metadata};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{Fingerprint, LogSource, SourceId};

struct OpenFile {
    file: File,
    identity: u64,
}

/// Log file addressed by path
///
/// The file is opened lazily and reopened whenever the path starts pointing at
/// a different file, so a rotated log is picked up by the next navigation.
/// The handle is mutex-protected: only one read is in flight at a time.
pub struct FileSource {
    id: SourceId,
    path: PathBuf,
    handle: Mutex<Option<OpenFile>>,
}

impl FileSource {
    pub fn new(id: impl Into<SourceId>, path: impl AsRef<Path>) -> Self {
        Self {
            id: id.into(),
            path: path.as_ref().to_path_buf(),
            handle: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn identity_of(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.dev().rotate_left(32) ^ metadata.ino()
}

#[cfg(not(unix))]
fn identity_of(metadata: &Metadata) -> u64 {
    metadata
        .created()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

impl LogSource for FileSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn fingerprint(&self) -> io::Result<Fingerprint> {
        let metadata = std::fs::metadata(&self.path)?;
        Ok(Fingerprint::new(metadata.len(), identity_of(&metadata)))
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut handle = self
            .handle
            .lock()
            .map_err(|_| io::Error::other("Failed to lock file"))?;

        let current = identity_of(&std::fs::metadata(&self.path)?);
        if handle.as_ref().is_some_and(|open| open.identity != current) {
            debug!(source = %self.id, path = %self.path.display(), "File replaced, reopening");
            *handle = None;
        }

        if handle.is_none() {
            let file = File::open(&self.path)?;
            let identity = identity_of(&file.metadata()?);
            *handle = Some(OpenFile { file, identity });
        }

        let open = handle
            .as_mut()
            .ok_or_else(|| io::Error::other("File handle unavailable"))?;
        open.file.seek(SeekFrom::Start(offset))?;
        open.file.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let source = FileSource::new("missing", temp_dir.path().join("nope.log"));

        let err = source.fingerprint().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_read_at_offset() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, b"first line\nsecond line\n").unwrap();

        let source = FileSource::new("app", &path);
        assert_eq!(source.path(), path);
        assert_eq!(source.fingerprint().unwrap().len, 23);

        let mut buf = [0u8; 6];
        let n = source.read_at(11, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"second");

        let n = source.read_at(23, &mut buf).unwrap();
        assert_eq!(n, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_rotation_changes_identity() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, b"old content\n").unwrap();

        let source = FileSource::new("app", &path);
        let before = source.fingerprint().unwrap();
        let mut buf = [0u8; 3];
        source.read_at(0, &mut buf).unwrap();

        // Rotate: move the old file away and create a fresh one at the path
        fs::rename(&path, temp_dir.path().join("app.log.1")).unwrap();
        fs::write(&path, b"new content, longer\n").unwrap();

        let after = source.fingerprint().unwrap();
        assert!(before.invalidated_by(&after));

        let n = source.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"new");
    }

    #[test]
    fn test_deleted_file_fails_reads_with_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, b"line\n").unwrap();

        let source = FileSource::new("app", &path);
        let mut buf = [0u8; 4];
        source.read_at(0, &mut buf).unwrap();
        fs::remove_file(source.path()).unwrap();

        assert_eq!(source.read_at(0, &mut buf).unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(source.fingerprint().unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
