//! Navigation counters and tracing setup

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::navigation::{NavigationError, Resolution};

/// Counters shared by every navigation of a factory
#[derive(Debug, Default)]
pub struct Metrics {
    requested: AtomicU64,
    resolved: AtomicU64,
    empty: AtomicU64,
    failed: AtomicU64,
    probes: AtomicU64,
    cache_hits: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigation_requested(&self) {
        self.requested.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "requested", "Metric incremented");
    }

    /// Counts a settled navigation by outcome
    pub fn record(&self, outcome: &Result<Resolution, NavigationError>) {
        let counter = match outcome {
            Ok(Resolution::Pointer(_)) => {
                self.resolved.fetch_add(1, Ordering::Relaxed);
                "resolved"
            }
            Ok(Resolution::Empty) => {
                self.empty.fetch_add(1, Ordering::Relaxed);
                "empty"
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                "failed"
            }
        };
        tracing::debug!(counter, "Metric incremented");
    }

    pub fn probes_issued(&self, probes: u64) {
        if probes > 0 {
            self.probes.fetch_add(probes, Ordering::Relaxed);
        }
    }

    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "cache_hits", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requested: self.requested.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requested: u64,
    pub resolved: u64,
    pub empty: u64,
    pub failed: u64,
    pub probes: u64,
    pub cache_hits: u64,
}

/// Installs the global fmt subscriber, filtered by `RUST_LOG`
///
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}
