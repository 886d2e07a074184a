//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Uplink - store-and-forward delivery relay for sensor readings
#[derive(Parser, Debug)]
#[command(
    name = "uplink",
    author,
    version,
    about = "Store-and-forward delivery relay",
    long_about = "A store-and-forward delivery relay for timestamped sensor readings.\n\n\
                  Listens for line-protocol readings, buffers them per destination, \n\
                  and periodically flushes batches over HTTP, retaining unsent data \n\
                  across delivery failures."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "UPLINK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "UPLINK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the delivery relay
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "UPLINK_CONFIG")]
    pub config: PathBuf,

    /// Override the reading source bind address from configuration
    #[arg(long, env = "UPLINK_BIND")]
    pub bind: Option<String>,

    /// Relay timeout in seconds (0 = run until stopped)
    #[arg(long, default_value = "0", env = "UPLINK_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size between the reading source and the fan-out loop
    #[arg(long, default_value = "100", env = "UPLINK_SOURCE_QUEUE")]
    pub source_queue: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "UPLINK_METRICS_PORT")]
    pub metrics_port: u16,

    /// Seconds between configuration reload checks (0 = disabled)
    #[arg(long, default_value = "10", env = "UPLINK_RELOAD_INTERVAL")]
    pub reload_interval: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON (credentials redacted)
    #[arg(long)]
    pub json: bool,

    /// Show per-destination settings (credentials redacted)
    #[arg(long)]
    pub settings: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
