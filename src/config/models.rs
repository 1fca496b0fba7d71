use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub timestamp: TimestampConfig,
    /// Named log sources, addressable by name from the CLI
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

impl Config {
    /// Bound applied when a caller waits without giving its own timeout
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation.default_timeout_ms)
    }

    /// Timestamp format for a named source, falling back to the global one
    pub fn timestamp_format_for(&self, name: &str) -> &str {
        self.sources
            .get(name)
            .and_then(|source| source.timestamp_format.as_deref())
            .unwrap_or(&self.timestamp.format)
    }
}

/// Worker pool and search tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NavigationConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Pending navigations per worker before requests are rejected
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    #[serde(default = "default_read_buffer")]
    pub read_buffer: ByteSize,
    #[serde(default = "default_probe_cache_entries")]
    pub probe_cache_entries: usize,
    #[serde(default = "default_pointer_cache_entries")]
    pub pointer_cache_entries: usize,
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_depth: default_queue_depth(),
            read_buffer: default_read_buffer(),
            probe_cache_entries: default_probe_cache_entries(),
            pointer_cache_entries: default_pointer_cache_entries(),
            default_timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_queue_depth() -> usize {
    64
}

fn default_read_buffer() -> ByteSize {
    ByteSize::kib(64)
}

fn default_probe_cache_entries() -> usize {
    1024
}

fn default_pointer_cache_entries() -> usize {
    256
}

fn default_timeout_ms() -> u64 {
    5000
}

/// How timestamps are read from the start of each line
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimestampConfig {
    /// strftime pattern, or "rfc3339"
    #[serde(default = "default_timestamp_format")]
    pub format: String,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            format: default_timestamp_format(),
        }
    }
}

fn default_timestamp_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

/// A log file known by name
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Overrides `[timestamp].format` for this source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_format: Option<String>,
}
