//! # thermo-ingest
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Acquisition lifecycle (start, wait for signal or timeout, stop)
//! - Serial port discovery

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_ingest, run_ports, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "thermo-ingest starting");

    let result = match &cli.command {
        Commands::Run(args) => run_ingest(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Ports(args) => run_ports(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(observability_config(cli))
}

fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    ObservabilityConfig {
        log_format: cli.log_format,
        // The run command installs the exporter once its port is known
        metrics_port: None,
        log_level: log_level.to_string(),
        ignore_env: cli.quiet,
    }
}
