use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lognav")]
#[command(about = "Seek into large log files by byte offset or timestamp", long_about = None)]
pub struct Cli {
    /// Configuration file (overrides LOGNAV_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// How long to wait for a navigation, in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a byte offset; offsets past the end resolve to the end
    Byte(ByteArgs),
    /// Resolve the earliest record with the latest timestamp not after the target
    Date(DateArgs),
    /// Print lines starting at a resolved position
    Read(ReadArgs),
    /// List configured sources
    Sources,
}

#[derive(Args, Debug)]
pub struct ByteArgs {
    /// Configured source name or path to a log file
    pub source: String,
    pub offset: u64,
}

#[derive(Args, Debug)]
pub struct DateArgs {
    /// Configured source name or path to a log file
    pub source: String,
    /// RFC 3339, or the source's timestamp format
    pub timestamp: String,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Configured source name or path to a log file
    pub source: String,

    #[arg(long, conflicts_with = "from_byte")]
    pub from_date: Option<String>,

    #[arg(long)]
    pub from_byte: Option<u64>,

    /// Maximum number of lines to print
    #[arg(long, default_value_t = 20)]
    pub lines: usize,
}
