//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use observability::LogFormat;
use std::path::PathBuf;

/// thermo-ingest - serial temperature sensor ingestion
#[derive(Parser, Debug)]
#[command(
    name = "thermo-ingest",
    author,
    version,
    about = "Serial temperature sensor ingestion pipeline",
    long_about = "Reads temperature reports from a serial-attached sensor, parses them \n\
                  into readings and hands each reading to the configured sink."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "THERMO_INGEST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format: json, pretty or compact
    #[arg(
        long,
        default_value = "pretty",
        global = true,
        env = "THERMO_INGEST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire readings until Ctrl+C, SIGTERM or timeout
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// List serial ports visible to the system
    Ports(PortsArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "thermo.toml",
        env = "THERMO_INGEST_CONFIG"
    )]
    pub config: PathBuf,

    /// Override serial port from configuration
    #[arg(long, env = "THERMO_INGEST_PORT")]
    pub port: Option<String>,

    /// Override baud rate from configuration
    #[arg(long, env = "THERMO_INGEST_BAUD_RATE")]
    pub baud_rate: Option<u32>,

    /// Override ingestion queue capacity from configuration
    #[arg(long, env = "THERMO_INGEST_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Stop after this many seconds (0 = run until signalled)
    #[arg(long, default_value = "0", env = "THERMO_INGEST_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "THERMO_INGEST_METRICS_PORT")]
    pub metrics_port: u16,

    /// Replay a capture file instead of opening the serial port
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Bytes per read when replaying
    #[arg(long, default_value = "16")]
    pub replay_chunk_size: usize,

    /// Milliseconds between reads when replaying
    #[arg(long, default_value = "100")]
    pub replay_interval_ms: u64,

    /// Loop the capture file when finished
    #[arg(long)]
    pub replay_loop: bool,

    /// Validate configuration and exit without opening the device
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "thermo.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `ports` command
#[derive(Parser, Debug)]
pub struct PortsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
