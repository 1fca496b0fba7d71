//! Configuration management for lognav
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use lognav::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Navigation workers: {}", config.navigation.workers);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `LOGNAV__<section>__<key>`
//!
//! Examples:
//! - `LOGNAV__NAVIGATION__WORKERS=8`
//! - `LOGNAV__NAVIGATION__READ_BUFFER=256KB`
//! - `LOGNAV__TIMESTAMP__FORMAT=rfc3339`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/lognav.toml`.
//! This can be overridden using the `LOGNAV_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, NavigationConfig, SourceConfig, TimestampConfig};
pub use validation::ValidationError;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`LOGNAV__*`)
    /// 2. TOML file (default: `config/lognav.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path.as_ref())?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("lognav.toml");

        let toml_content = r#"
[navigation]
workers = 8
queue_depth = 16
read_buffer = "128KB"
probe_cache_entries = 0
pointer_cache_entries = 32
default_timeout_ms = 250

[timestamp]
format = "%Y-%m-%dT%H:%M:%S"

[sources.app]
path = "/var/log/app.log"

[sources.audit]
path = "/var/log/audit.log"
timestamp_format = "rfc3339"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(&config_path).unwrap();
        assert_eq!(config.navigation.workers, 8);
        assert_eq!(config.navigation.probe_cache_entries, 0);
        assert_eq!(config.default_timeout().as_millis(), 250);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.timestamp_format_for("app"), "%Y-%m-%dT%H:%M:%S");
        assert_eq!(config.timestamp_format_for("audit"), "rfc3339");
    }

    #[test]
    fn test_validation_runs_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("lognav.toml");

        fs::write(&config_path, "[navigation]\nworkers = 0\n").unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::NoWorkers)
        ));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("lognav.toml");

        fs::write(&config_path, "[navigation]\nworkers = \"many\"\n").unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(matches!(result.unwrap_err(), ConfigError::LoadError(_)));
    }
}
