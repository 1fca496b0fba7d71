use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "LOGNAV_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/lognav.toml";
const ENV_PREFIX: &str = "LOGNAV";
const ENV_SEPARATOR: &str = "__";

/// Path of the config file: `LOGNAV_CONFIG` or the default location
pub fn config_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();
    load_from_sources(&config_path())
}

/// Load configuration from a specific path and the environment
pub fn load_from_sources(config_path: &Path) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!(path = %config_path.display(), "Loading configuration");
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            path = %config_path.display(),
            "Configuration file not found, using defaults and environment overrides"
        );
    }

    // LOGNAV__NAVIGATION__WORKERS -> navigation.workers
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(&config_path).unwrap();
        assert_eq!(config.navigation.workers, 4);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(
            &config_path,
            r#"
[navigation]
workers = 2
read_buffer = "8KB"

[sources.app]
path = "/var/log/app.log"
timestamp_format = "rfc3339"
            "#,
        )
        .unwrap();

        let config = load_from_sources(&config_path).unwrap();
        assert_eq!(config.navigation.workers, 2);
        assert_eq!(config.navigation.read_buffer.as_u64(), 8 * 1024);
        assert_eq!(config.navigation.queue_depth, 64);
        assert_eq!(config.sources["app"].path, PathBuf::from("/var/log/app.log"));
    }

    // Environment overrides are not exercised here: set_var is unsafe in
    // edition 2024 and would race with other tests.
}
