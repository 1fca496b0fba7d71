use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::cache::FingerprintCache;
use super::error::{NavigationError, Result};
use super::future::{NavigationFuture, Resolution, Settler, pending};
use super::search::{DateSearch, ProbeCache};
use super::timestamp::TimestampParser;
use super::{Navigation, NavigationType};
use crate::config::NavigationConfig;
use crate::observability::Metrics;
use crate::source::{Fingerprint, LogPointer, LogSource};
use crate::worker::NavigationBroker;
use crate::worker::runner::NavigationJob;

/// Tuning for date navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateNavigationOptions {
    /// Bytes read per source access
    pub read_buffer: usize,
    /// Probe results kept per source, 0 disables
    pub probe_cache_entries: usize,
    /// Resolved pointers kept per source, 0 disables
    pub pointer_cache_entries: usize,
}

impl Default for DateNavigationOptions {
    fn default() -> Self {
        Self::from(&NavigationConfig::default())
    }
}

impl From<&NavigationConfig> for DateNavigationOptions {
    fn from(config: &NavigationConfig) -> Self {
        Self {
            read_buffer: config.read_buffer.as_u64() as usize,
            probe_cache_entries: config.probe_cache_entries,
            pointer_cache_entries: config.pointer_cache_entries,
        }
    }
}

struct DateShared {
    source: Arc<dyn LogSource>,
    parser: Arc<dyn TimestampParser>,
    read_buffer: usize,
    gate: Arc<tokio::sync::Mutex<()>>,
    probes: Mutex<ProbeCache>,
    pointers: Mutex<FingerprintCache<DateTime<Utc>, LogPointer>>,
    metrics: Arc<Metrics>,
}

/// Navigation by timestamp
///
/// The source length and identity are captured when `absolute()` is called;
/// the search runs later on the worker pool and only looks at content that
/// existed at request time. If the source was truncated or rotated in between,
/// or while searching, the future fails with
/// [`NavigationError::SourceChanged`].
pub struct DateOffsetNavigation {
    shared: Arc<DateShared>,
    broker: Arc<NavigationBroker>,
}

impl DateOffsetNavigation {
    pub fn new(
        source: Arc<dyn LogSource>,
        parser: Arc<dyn TimestampParser>,
        broker: Arc<NavigationBroker>,
        options: DateNavigationOptions,
        metrics: Arc<Metrics>,
    ) -> Self {
        let shared = DateShared {
            source,
            parser,
            read_buffer: options.read_buffer,
            gate: Arc::new(tokio::sync::Mutex::new(())),
            probes: Mutex::new(ProbeCache::new(options.probe_cache_entries)),
            pointers: Mutex::new(FingerprintCache::new(options.pointer_cache_entries)),
            metrics,
        };
        Self {
            shared: Arc::new(shared),
            broker,
        }
    }

    fn settle_now(&self, outcome: Result<Resolution>) -> NavigationFuture {
        self.shared.metrics.record(&outcome);
        NavigationFuture::ready(outcome)
    }
}

impl Navigation<DateTime<Utc>> for DateOffsetNavigation {
    fn navigation_type(&self) -> NavigationType {
        NavigationType::Date
    }

    fn absolute(&self, offset: DateTime<Utc>) -> NavigationFuture {
        self.shared.metrics.navigation_requested();
        let id = self.shared.source.id().clone();

        let requested = match self.shared.source.fingerprint() {
            Ok(fingerprint) if fingerprint.is_empty() => {
                return self.settle_now(Ok(Resolution::Empty));
            }
            Ok(fingerprint) => fingerprint,
            Err(e) => return self.settle_now(Err(NavigationError::io(&id, e))),
        };

        let (settler, future) = pending();
        debug!(
            source = %id,
            request_id = %future.request_id(),
            target = %offset,
            len = requested.len,
            "Date navigation queued"
        );

        let gate = self.shared.gate.clone();
        let shared = self.shared.clone();
        let job = NavigationJob::new(
            id,
            gate,
            settler,
            Box::new(move |settler: &Settler| shared.resolve(offset, requested, settler)),
        );
        self.broker.submit(job);
        future
    }
}

impl DateShared {
    fn resolve(
        &self,
        target: DateTime<Utc>,
        requested: Fingerprint,
        settler: &Settler,
    ) -> Result<Resolution> {
        let id = self.source.id();
        let current = self
            .source
            .fingerprint()
            .map_err(|e| NavigationError::vanished_or_io(id, e))?;
        if requested.invalidated_by(&current) {
            debug!(source = %id, "Source changed before navigation started");
            return Err(NavigationError::SourceChanged(id.clone()));
        }

        let cached = self
            .pointers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&requested, &target);
        if let Some(pointer) = cached {
            self.metrics.cache_hit();
            return Ok(Resolution::Pointer(pointer));
        }

        let found = {
            let mut probes = self
                .probes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let should_stop = || settler.should_stop();
            let mut search = DateSearch::new(
                &*self.source,
                &*self.parser,
                requested,
                self.read_buffer,
                &mut probes,
                &should_stop,
            );
            let found = search.floor(target);
            self.metrics.probes_issued(search.probes());
            debug!(
                source = %id,
                request_id = %settler.request_id(),
                probes = search.probes(),
                "Date search finished"
            );
            let found = found?;
            search.checkpoint()?;
            found
        };

        let pointer = match found {
            Some(record) => {
                LogPointer::with_timestamp(id.clone(), record.offset, requested.len, record.timestamp)
            }
            None => LogPointer::new(id.clone(), 0, requested.len),
        };
        self.pointers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(requested, target, pointer.clone());

        Ok(Resolution::Pointer(pointer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::timestamp::PatternParser;
    use crate::source::{FileSource, MemorySource};
    use chrono::{Duration, TimeZone};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    fn ts(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, sec).unwrap()
    }

    fn navigation(source: Arc<dyn LogSource>) -> (DateOffsetNavigation, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let broker = NavigationBroker::spawn(2, 8, metrics.clone());
        let nav = DateOffsetNavigation::new(
            source,
            Arc::new(PatternParser::new(FORMAT)),
            broker,
            DateNavigationOptions {
                read_buffer: 16,
                ..DateNavigationOptions::default()
            },
            metrics.clone(),
        );
        (nav, metrics)
    }

    /// Leading integer is epoch seconds
    struct EpochParser;

    impl TimestampParser for EpochParser {
        fn parse(&self, line: &str) -> Option<DateTime<Utc>> {
            let secs = line.split_whitespace().next()?.parse::<i64>().ok()?;
            DateTime::from_timestamp(secs, 0)
        }
    }

    fn epoch(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_records_at_uneven_offsets() {
        // Records at [0, 10, 25, 40, 55] stamped [T0, T1, T1, T2, T3]
        let text = "100 aaaaa\n200 bbbbbbbbbb\n200 cccccccccc\n300 dddddddddd\n400 eeee\n";
        let metrics = Arc::new(Metrics::new());
        let nav = DateOffsetNavigation::new(
            Arc::new(MemorySource::new("app", text)),
            Arc::new(EpochParser),
            NavigationBroker::spawn(1, 4, metrics.clone()),
            DateNavigationOptions {
                read_buffer: 8,
                ..DateNavigationOptions::default()
            },
            metrics,
        );

        let at = |r: Resolution| r.into_pointer().unwrap().offset();
        assert_eq!(at(nav.absolute(epoch(200)).await.unwrap()), 10);
        assert_eq!(at(nav.absolute(epoch(250)).await.unwrap()), 10);
        assert_eq!(at(nav.absolute(epoch(300)).await.unwrap()), 40);
        assert_eq!(at(nav.absolute(epoch(50)).await.unwrap()), 0);
        assert_eq!(at(nav.absolute(epoch(999)).await.unwrap()), 55);
    }

    #[tokio::test]
    async fn test_floor_with_earliest_duplicate() {
        let lines = [
            (1, "boot"),
            (2, "first T1"),
            (2, "second T1"),
            (3, "T2"),
            (4, "T3"),
        ];
        let mut text = String::new();
        let mut offsets = Vec::new();
        for (sec, msg) in lines {
            offsets.push(text.len() as u64);
            text.push_str(&format!("{} {}\n", ts(sec).format(FORMAT), msg));
        }
        let (nav, _) = navigation(Arc::new(MemorySource::new("app", text)));

        let at = |r: Resolution| r.into_pointer().unwrap().offset();
        assert_eq!(at(nav.absolute(ts(2)).await.unwrap()), offsets[1]);
        assert_eq!(at(nav.absolute(ts(3)).await.unwrap()), offsets[3]);
        assert_eq!(at(nav.absolute(ts(1) - Duration::seconds(1)).await.unwrap()), offsets[0]);
        assert_eq!(at(nav.absolute(ts(59)).await.unwrap()), offsets[4]);
    }

    #[tokio::test]
    async fn test_pointer_carries_record_timestamp() {
        let text = format!("{} a\n{} b\n", ts(1).format(FORMAT), ts(5).format(FORMAT));
        let (nav, _) = navigation(Arc::new(MemorySource::new("app", text)));

        let pointer = nav.absolute(ts(3)).await.unwrap().into_pointer().unwrap();
        assert_eq!(pointer.offset(), 0);
        assert_eq!(pointer.timestamp(), Some(ts(1)));
        assert!(!pointer.is_end());
    }

    #[tokio::test]
    async fn test_empty_source_settles_empty() {
        let (nav, metrics) = navigation(Arc::new(MemorySource::empty("app")));
        assert!(nav.absolute(ts(1)).await.unwrap().is_empty());
        assert_eq!(metrics.snapshot().empty, 1);
    }

    #[tokio::test]
    async fn test_repeat_hits_pointer_cache() {
        let text = format!("{} a\n{} b\n", ts(1).format(FORMAT), ts(5).format(FORMAT));
        let (nav, metrics) = navigation(Arc::new(MemorySource::new("app", text)));

        let first = nav.absolute(ts(5)).await.unwrap();
        let second = nav.absolute(ts(5)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(metrics.snapshot().cache_hits, 1);
    }

    #[tokio::test]
    async fn test_truncated_between_request_and_resolution() {
        let text = format!("{} a\n{} b\n", ts(1).format(FORMAT), ts(5).format(FORMAT));
        let source = Arc::new(MemorySource::new("app", text));
        let (nav, _) = navigation(source.clone());

        let gate = nav.shared.gate.clone();
        let held = gate.lock().await;
        let future = nav.absolute(ts(5));
        source.truncate(10).unwrap();
        drop(held);

        assert!(matches!(future.await, Err(NavigationError::SourceChanged(_))));
    }

    #[tokio::test]
    async fn test_file_deleted_before_resolution() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        std::fs::write(&path, format!("{} a\n{} b\n", ts(1).format(FORMAT), ts(5).format(FORMAT)))
            .unwrap();
        let (nav, metrics) = navigation(Arc::new(FileSource::new("app", &path)));

        let gate = nav.shared.gate.clone();
        let held = gate.lock().await;
        let future = nav.absolute(ts(5));
        std::fs::remove_file(&path).unwrap();
        drop(held);

        assert!(matches!(future.await, Err(NavigationError::SourceChanged(_))));
        assert_eq!(metrics.snapshot().failed, 1);
    }

    #[tokio::test]
    async fn test_appends_after_request_are_ignored() {
        let text = format!("{} a\n", ts(1).format(FORMAT));
        let source = Arc::new(MemorySource::new("app", text));
        let (nav, _) = navigation(source.clone());

        let gate = nav.shared.gate.clone();
        let held = gate.lock().await;
        let future = nav.absolute(ts(9));
        source
            .append(format!("{} b\n", ts(9).format(FORMAT)).as_bytes())
            .unwrap();
        drop(held);

        let pointer = future.await.unwrap().into_pointer().unwrap();
        assert_eq!(pointer.offset(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let text = format!("{} a\n", ts(1).format(FORMAT));
        let (nav, _) = navigation(Arc::new(MemorySource::new("app", text)));

        let gate = nav.shared.gate.clone();
        let held = gate.lock().await;
        let future = nav.absolute(ts(1));
        future.cancel();
        drop(held);

        assert!(matches!(future.await, Err(NavigationError::Cancelled)));
    }
}
