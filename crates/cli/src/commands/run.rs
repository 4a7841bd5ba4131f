//! `run` command implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{DeviceConnector, IngestConfig};
use ingestion::{ReplayConfig, ReplayConnector, SerialConnector};
use lifecycle::LifecycleController;
use tracing::{info, warn};

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_ingest(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config)
        .context("Configuration invalid after command-line overrides")?;

    info!(
        port = %config.device.port,
        baud_rate = config.device.baud_rate,
        queue_capacity = config.queue.capacity,
        policy = ?config.queue.policy,
        sink = %config.sink.name,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let sink = persistence::create_sink(&config.sink).context("Failed to create sink")?;
    let connector = build_connector(args);
    let mut controller = LifecycleController::from_config(&config, connector, sink);

    controller
        .start()
        .await
        .with_context(|| format!("Failed to open {}", config.device.port))?;

    let timeout: Pin<Box<dyn Future<Output = ()> + Send>> = if args.timeout == 0 {
        Box::pin(std::future::pending())
    } else {
        Box::pin(tokio::time::sleep(Duration::from_secs(args.timeout)))
    };

    tokio::select! {
        _ = setup_shutdown_signal() => {
            warn!("Received shutdown signal, stopping acquisition...");
        }
        _ = timeout => {
            info!(timeout_secs = args.timeout, "Timeout reached, stopping acquisition...");
        }
    }

    if !controller.is_acquiring() {
        warn!("Reader had already exited before shutdown");
    }

    let stats = controller
        .stop()
        .await
        .context("Failed to stop acquisition cleanly")?;

    if let Some(stats) = stats {
        info!(
            readings_parsed = stats.readings_parsed,
            saves_succeeded = stats.saves_succeeded,
            saves_failed = stats.saves_failed,
            duration_secs = stats.duration.as_secs_f64(),
            "Acquisition completed"
        );
        println!("\n{stats}");
    }

    info!("thermo-ingest finished");
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut IngestConfig, args: &RunArgs) {
    if let Some(ref port) = args.port {
        info!(port = %port, "Overriding serial port from CLI");
        config.device.port = port.clone();
    }
    if let Some(baud_rate) = args.baud_rate {
        info!(baud_rate, "Overriding baud rate from CLI");
        config.device.baud_rate = baud_rate;
    }
    if let Some(capacity) = args.queue_capacity {
        info!(capacity, "Overriding queue capacity from CLI");
        config.queue.capacity = capacity;
    }
}

fn build_connector(args: &RunArgs) -> Arc<dyn DeviceConnector> {
    match &args.replay {
        Some(path) => {
            info!(path = %path.display(), "Running in REPLAY mode");
            Arc::new(ReplayConnector::new(ReplayConfig {
                path: path.clone(),
                chunk_size: args.replay_chunk_size,
                interval: Duration::from_millis(args.replay_interval_ms),
                loop_playback: args.replay_loop,
            }))
        }
        None => Arc::new(SerialConnector::new()),
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &IngestConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Device:");
    println!("  Port: {}", config.device.port);
    println!("  Baud rate: {}", config.device.baud_rate);
    println!("  Read timeout: {} ms", config.device.read_timeout_ms);
    println!("  Read buffer: {} bytes", config.device.read_buffer_size);
    println!("\nQueue:");
    println!("  Capacity: {}", config.queue.capacity);
    println!("  Policy: {:?}", config.queue.policy);
    println!("\nSink:");
    println!("  {} ({:?})", config.sink.name, config.sink.sink_type);
    for (key, value) in &config.sink.params {
        println!("    {key} = {value}");
    }
    println!();
}
