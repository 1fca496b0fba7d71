use super::models::Config;
use crate::navigation::timestamp::is_valid_format;
use thiserror::Error;

/// Smallest read buffer that still holds a typical timestamp prefix
const MIN_READ_BUFFER: u64 = 64;

/// Largest read buffer; each scan allocates one up front
const MAX_READ_BUFFER: u64 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("navigation.workers must be at least 1")]
    NoWorkers,

    #[error("navigation.queue_depth must be at least 1")]
    NoQueueDepth,

    #[error("navigation.read_buffer ({actual} bytes) is below the minimum of {min} bytes")]
    ReadBufferTooSmall { actual: u64, min: u64 },

    #[error("navigation.read_buffer ({actual} bytes) exceeds the maximum of {max} bytes")]
    ReadBufferTooLarge { actual: u64, max: u64 },

    #[error("navigation.default_timeout_ms must be positive")]
    ZeroTimeout,

    #[error("Invalid timestamp format '{format}' for {scope}")]
    InvalidTimestampFormat { scope: String, format: String },

    #[error("Source '{name}' has an empty path")]
    EmptySourcePath { name: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_navigation(config)?;
    validate_timestamps(config)?;
    validate_sources(config)?;
    Ok(())
}

fn validate_navigation(config: &Config) -> Result<(), ValidationError> {
    let navigation = &config.navigation;
    if navigation.workers == 0 {
        return Err(ValidationError::NoWorkers);
    }
    if navigation.queue_depth == 0 {
        return Err(ValidationError::NoQueueDepth);
    }
    if navigation.read_buffer.as_u64() < MIN_READ_BUFFER {
        return Err(ValidationError::ReadBufferTooSmall {
            actual: navigation.read_buffer.as_u64(),
            min: MIN_READ_BUFFER,
        });
    }
    if navigation.read_buffer.as_u64() > MAX_READ_BUFFER {
        return Err(ValidationError::ReadBufferTooLarge {
            actual: navigation.read_buffer.as_u64(),
            max: MAX_READ_BUFFER,
        });
    }
    if navigation.default_timeout_ms == 0 {
        return Err(ValidationError::ZeroTimeout);
    }
    Ok(())
}

/// Global format plus every per-source override
fn validate_timestamps(config: &Config) -> Result<(), ValidationError> {
    if !is_valid_format(&config.timestamp.format) {
        return Err(ValidationError::InvalidTimestampFormat {
            scope: "timestamp.format".to_string(),
            format: config.timestamp.format.clone(),
        });
    }

    for (name, source) in &config.sources {
        if let Some(format) = &source.timestamp_format {
            if !is_valid_format(format) {
                return Err(ValidationError::InvalidTimestampFormat {
                    scope: format!("source '{name}'"),
                    format: format.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_sources(config: &Config) -> Result<(), ValidationError> {
    for (name, source) in &config.sources {
        if source.path.as_os_str().is_empty() {
            return Err(ValidationError::EmptySourcePath { name: name.clone() });
        }
    }
    Ok(())
}
