use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use lognav::config::Config;
use lognav::factory::LogPointerFactory;
use lognav::navigation::timestamp::parser_for;
use lognav::navigation::{NavigationTarget, Resolution, TimestampParser};
use lognav::source::{LogPointer, SourceId};

use crate::cli::{Cli, Commands};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Requests made for one navigation when failures are transient
const NAVIGATION_ATTEMPTS: u32 = 3;

#[derive(Serialize)]
struct PointerOutput<'a> {
    source: &'a SourceId,
    /// `null` when the source is empty
    pointer: Option<LogPointer>,
}

#[derive(Serialize)]
struct ReadOutput<'a> {
    source: &'a SourceId,
    lines: Vec<String>,
    next: Option<LogPointer>,
}

#[derive(Serialize)]
struct SourceOutput<'a> {
    name: &'a str,
    path: &'a Path,
    timestamp_format: &'a str,
}

pub async fn run(cli: Cli, config: Config) -> Result<(), AnyError> {
    let factory = LogPointerFactory::from_config(&config);
    let timeout = cli
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.default_timeout());

    match cli.command {
        Commands::Sources => {
            let listing: Vec<_> = config
                .sources
                .iter()
                .map(|(name, source)| SourceOutput {
                    name,
                    path: &source.path,
                    timestamp_format: config.timestamp_format_for(name),
                })
                .collect();
            print_json(&listing)?;
        }
        Commands::Byte(args) => {
            let id = source_id(&factory, &config, &args.source);
            let resolution = navigate(&factory, &id, args.offset.into(), timeout).await?;
            print_json(&PointerOutput {
                source: &id,
                pointer: resolution.into_pointer(),
            })?;
        }
        Commands::Date(args) => {
            let id = source_id(&factory, &config, &args.source);
            let target = parse_timestamp(&args.timestamp, config.timestamp_format_for(&args.source))?;
            let resolution = navigate(&factory, &id, target.into(), timeout).await?;
            print_json(&PointerOutput {
                source: &id,
                pointer: resolution.into_pointer(),
            })?;
        }
        Commands::Read(args) => {
            let id = source_id(&factory, &config, &args.source);
            let target = match (&args.from_date, args.from_byte) {
                (Some(timestamp), _) => {
                    parse_timestamp(timestamp, config.timestamp_format_for(&args.source))?.into()
                }
                (None, Some(offset)) => NavigationTarget::Byte(offset),
                (None, None) => NavigationTarget::Byte(0),
            };

            let output = match navigate(&factory, &id, target, timeout).await? {
                Resolution::Pointer(pointer) => {
                    let reader = factory.reader(&id)?;
                    let max_lines = args.lines;
                    let batch = tokio::task::spawn_blocking(move || reader.read_lines(&pointer, max_lines))
                        .await??;
                    ReadOutput {
                        source: &id,
                        lines: batch.lines,
                        next: Some(batch.next),
                    }
                }
                Resolution::Empty => ReadOutput {
                    source: &id,
                    lines: Vec::new(),
                    next: None,
                },
            };
            print_json(&output)?;
        }
    }

    debug!(metrics = ?factory.metrics(), healthy = factory.is_healthy(), "Command finished");
    Ok(())
}

/// Configured name, or a path registered on the fly under its own name
fn source_id(factory: &LogPointerFactory, config: &Config, source: &str) -> SourceId {
    if config.sources.contains_key(source) {
        return SourceId::new(source);
    }
    let parser: Arc<dyn TimestampParser> = Arc::from(parser_for(&config.timestamp.format));
    factory.register_file(source, source, Some(parser))
}

async fn navigate(
    factory: &LogPointerFactory,
    id: &SourceId,
    target: NavigationTarget,
    timeout: Duration,
) -> Result<Resolution, AnyError> {
    let mut attempt = 1;
    loop {
        let mut future = factory.navigate(id, target);
        debug!(source = %id, request_id = %future.request_id(), ?target, attempt, "Navigating");
        match future.wait_for(timeout).await {
            Err(e) if e.is_transient() && attempt < NAVIGATION_ATTEMPTS => {
                warn!(source = %id, error = %e, attempt, "Navigation failed, retrying");
                attempt += 1;
            }
            outcome => return Ok(outcome?),
        }
    }
}

/// RFC 3339 first, then the source's own format
fn parse_timestamp(input: &str, format: &str) -> Result<DateTime<Utc>, AnyError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    parser_for(format)
        .parse(input)
        .ok_or_else(|| format!("cannot parse timestamp '{input}' as RFC 3339 or '{format}'").into())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AnyError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
