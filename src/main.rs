mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use lognav::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    lognav::observability::init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    commands::run(cli, config).await
}
