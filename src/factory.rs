//! Entry point for navigating registered log sources

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::config::{Config, NavigationConfig};
use crate::navigation::date::DateNavigationOptions;
use crate::navigation::timestamp::parser_for;
use crate::navigation::{
    ByteOffsetNavigation, DateOffsetNavigation, Navigation, NavigationError, NavigationFuture,
    NavigationTarget, Result, TimestampParser,
};
use crate::observability::{Metrics, MetricsSnapshot};
use crate::reader::LogReader;
use crate::source::{FileSource, LogSource, SourceId};
use crate::worker::NavigationBroker;

struct SourceEntry {
    source: Arc<dyn LogSource>,
    byte: Arc<ByteOffsetNavigation>,
    date: Option<Arc<DateOffsetNavigation>>,
}

/// Registry of log sources and their navigations
///
/// Navigations are built once per source at registration and shared by every
/// caller. All date navigations run on one worker pool owned by the factory.
pub struct LogPointerFactory {
    broker: Arc<NavigationBroker>,
    metrics: Arc<Metrics>,
    options: DateNavigationOptions,
    sources: RwLock<HashMap<SourceId, Arc<SourceEntry>>>,
}

impl LogPointerFactory {
    /// Creates the factory and starts its worker pool
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn new(config: &NavigationConfig) -> Self {
        let metrics = Arc::new(Metrics::new());
        let broker = NavigationBroker::spawn(config.workers, config.queue_depth, metrics.clone());
        info!(workers = config.workers, queue_depth = config.queue_depth, "LogPointerFactory started");

        Self {
            broker,
            metrics,
            options: DateNavigationOptions::from(config),
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Creates the factory with every `[sources.*]` entry registered as a file
    pub fn from_config(config: &Config) -> Self {
        let factory = Self::new(&config.navigation);
        for (name, source) in &config.sources {
            let parser: Arc<dyn TimestampParser> = Arc::from(parser_for(config.timestamp_format_for(name)));
            factory.register_file(name.as_str(), &source.path, Some(parser));
        }
        factory
    }

    /// Registers a source, replacing any source with the same id
    ///
    /// Without a parser the source supports byte navigation only.
    pub fn register(
        &self,
        source: Arc<dyn LogSource>,
        parser: Option<Arc<dyn TimestampParser>>,
    ) -> SourceId {
        let id = source.id().clone();
        let byte = Arc::new(ByteOffsetNavigation::new(source.clone(), self.metrics.clone()));
        let date = parser.map(|parser| {
            Arc::new(DateOffsetNavigation::new(
                source.clone(),
                parser,
                self.broker.clone(),
                self.options,
                self.metrics.clone(),
            ))
        });
        let date_enabled = date.is_some();

        let entry = Arc::new(SourceEntry { source, byte, date });
        let replaced = self.write_sources().insert(id.clone(), entry).is_some();
        if replaced {
            warn!(source = %id, "Replaced registered source");
        } else {
            info!(source = %id, date_enabled, "Source registered");
        }
        id
    }

    /// Registers a file by path under `name`
    pub fn register_file(
        &self,
        name: impl Into<SourceId>,
        path: impl AsRef<Path>,
        parser: Option<Arc<dyn TimestampParser>>,
    ) -> SourceId {
        let source = FileSource::new(name, path);
        debug!(source = %source.id(), path = %source.path().display(), "Registering log file");
        self.register(Arc::new(source), parser)
    }

    /// Removes a source; in-flight navigations still settle
    pub fn deregister(&self, id: &SourceId) -> bool {
        let removed = self.write_sources().remove(id).is_some();
        if removed {
            info!(source = %id, "Source deregistered");
        }
        removed
    }

    /// Registered source ids, sorted
    pub fn sources(&self) -> Vec<SourceId> {
        let mut ids: Vec<SourceId> = self.read_sources().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn source(&self, id: &SourceId) -> Result<Arc<dyn LogSource>> {
        Ok(self.entry(id)?.source.clone())
    }

    pub fn byte_navigation(&self, id: &SourceId) -> Result<Arc<ByteOffsetNavigation>> {
        Ok(self.entry(id)?.byte.clone())
    }

    pub fn date_navigation(&self, id: &SourceId) -> Result<Arc<DateOffsetNavigation>> {
        self.entry(id)?
            .date
            .clone()
            .ok_or_else(|| NavigationError::DateNavigationUnsupported(id.clone()))
    }

    /// Reader over a registered source, using the configured read buffer
    pub fn reader(&self, id: &SourceId) -> Result<LogReader> {
        Ok(LogReader::new(self.source(id)?, self.options.read_buffer))
    }

    /// Dispatches to the navigation matching the target
    ///
    /// Lookup failures settle the returned future instead of returning early.
    pub fn navigate(&self, id: &SourceId, target: impl Into<NavigationTarget>) -> NavigationFuture {
        let outcome = match target.into() {
            NavigationTarget::Byte(offset) => self.byte_navigation(id).map(|nav| nav.absolute(offset)),
            NavigationTarget::Date(timestamp) => {
                self.date_navigation(id).map(|nav| nav.absolute(timestamp))
            }
        };
        outcome.unwrap_or_else(|e| {
            self.metrics.navigation_requested();
            let outcome = Err(e);
            self.metrics.record(&outcome);
            NavigationFuture::ready(outcome)
        })
    }

    /// Pointer to the first byte
    pub fn start(&self, id: &SourceId) -> NavigationFuture {
        self.navigate(id, 0u64)
    }

    /// Pointer to the current end, for tailing
    pub fn end(&self, id: &SourceId) -> NavigationFuture {
        self.navigate(id, u64::MAX)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_healthy(&self) -> bool {
        self.broker.health_check()
    }

    fn entry(&self, id: &SourceId) -> Result<Arc<SourceEntry>> {
        self.read_sources()
            .get(id)
            .cloned()
            .ok_or_else(|| NavigationError::UnknownSource(id.clone()))
    }

    fn read_sources(&self) -> std::sync::RwLockReadGuard<'_, HashMap<SourceId, Arc<SourceEntry>>> {
        self.sources.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_sources(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<SourceId, Arc<SourceEntry>>> {
        self.sources.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
