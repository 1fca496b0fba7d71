use std::sync::Arc;

use tracing::debug;

use super::error::{NavigationError, Result};
use super::future::{NavigationFuture, Resolution};
use super::{Navigation, NavigationType};
use crate::observability::Metrics;
use crate::source::{LogPointer, LogSource};

/// Navigation by absolute byte offset
///
/// Only the source length is consulted, so requests settle before
/// `absolute()` returns. Offsets past the end resolve to the end: a log
/// truncated since the caller last looked is tailed from its new end.
pub struct ByteOffsetNavigation {
    source: Arc<dyn LogSource>,
    metrics: Arc<Metrics>,
}

impl ByteOffsetNavigation {
    pub fn new(source: Arc<dyn LogSource>, metrics: Arc<Metrics>) -> Self {
        Self { source, metrics }
    }

    fn resolve(&self, offset: u64) -> Result<Resolution> {
        let id = self.source.id();
        let fingerprint = self
            .source
            .fingerprint()
            .map_err(|e| NavigationError::io(id, e))?;
        if fingerprint.is_empty() {
            return Ok(Resolution::Empty);
        }

        let target = offset.min(fingerprint.len);
        if target < offset {
            debug!(source = %id, offset, len = fingerprint.len, "Offset past end, clamped");
        }
        Ok(Resolution::Pointer(LogPointer::new(
            id.clone(),
            target,
            fingerprint.len,
        )))
    }
}

impl Navigation<u64> for ByteOffsetNavigation {
    fn navigation_type(&self) -> NavigationType {
        NavigationType::Byte
    }

    fn absolute(&self, offset: u64) -> NavigationFuture {
        self.metrics.navigation_requested();
        let outcome = self.resolve(offset);
        self.metrics.record(&outcome);
        NavigationFuture::ready(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FileSource, MemorySource};
    use tempfile::TempDir;

    fn navigation(source: impl LogSource) -> ByteOffsetNavigation {
        ByteOffsetNavigation::new(Arc::new(source), Arc::new(Metrics::new()))
    }

    #[tokio::test]
    async fn test_offsets_within_source() {
        let nav = navigation(MemorySource::new("mem", "0123456789"));
        for offset in [0, 1, 5, 9, 10] {
            let pointer = nav.absolute(offset).await.unwrap().into_pointer().unwrap();
            assert_eq!(pointer.offset(), offset);
            assert_eq!(pointer.is_end(), offset == 10);
        }
    }

    #[tokio::test]
    async fn test_offset_past_end_is_clamped() {
        let nav = navigation(MemorySource::new("mem", "0123456789"));
        for offset in [11, 1_000, u64::MAX] {
            let pointer = nav.absolute(offset).await.unwrap().into_pointer().unwrap();
            assert_eq!(pointer.offset(), 10);
            assert!(pointer.is_end());
        }
    }

    #[tokio::test]
    async fn test_empty_source() {
        let nav = navigation(MemorySource::empty("mem"));
        assert!(nav.absolute(0).await.unwrap().is_empty());
        assert!(nav.absolute(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_truncated_source_clamps_to_new_end() {
        let source = Arc::new(MemorySource::new("mem", "0123456789"));
        let nav = ByteOffsetNavigation::new(source.clone(), Arc::new(Metrics::new()));

        source.truncate(4).unwrap();
        let pointer = nav.absolute(8).await.unwrap().into_pointer().unwrap();
        assert_eq!(pointer.offset(), 4);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let nav = navigation(FileSource::new("gone", temp_dir.path().join("gone.log")));

        let err = nav.absolute(0).await.unwrap_err();
        assert!(matches!(err, NavigationError::Io { .. }));
    }

    #[tokio::test]
    async fn test_idempotent() {
        let nav = navigation(MemorySource::new("mem", "abc\ndef\n"));
        let first = nav.absolute(4).await.unwrap();
        let second = nav.absolute(4).await.unwrap();
        assert_eq!(first, second);
    }
}
