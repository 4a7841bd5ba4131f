//! Mock Pipeline Example
//!
//! Feeds a scripted thermometer through the full controller: reader, queue,
//! sink worker. Runs without any serial hardware.
//!
//! Run with: cargo run -p demos --bin mock_pipeline [config.toml]

use std::collections::HashMap;
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{
    BackpressurePolicy, ConfigVersion, DeviceConfig, IngestConfig, QueueConfig, SinkConfig,
    SinkType,
};
use ingestion::ScriptedConnector;
use lifecycle::LifecycleController;
use persistence::create_sink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize observability (pretty tracing, no exporter)
    observability::init()?;

    tracing::info!("Starting Mock Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        create_test_config()
    };

    // ==== Stage 2: Scripted device ====
    // Firmware-style output with the occasional glitch mixed in
    let mut lines: Vec<String> = (0..40)
        .map(|i| format!("{:.2} Celsius, ", 21.0 + (i as f64 * 0.37).sin()))
        .collect();
    lines.insert(7, "\r\n".to_string());
    lines.insert(19, "Celsius".to_string());
    lines.insert(31, "23.5.1".to_string());
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

    let connector =
        ScriptedConnector::from_lines(&lines).with_chunk_interval(Duration::from_millis(25));

    // ==== Stage 3: Sink and controller ====
    let sink = create_sink(&config.sink)?;
    let mut controller = LifecycleController::from_config(&config, connector, sink);

    // ==== Stage 4: Run ====
    controller.start().await?;
    tracing::info!(state = %controller.state(), "Pipeline running");

    tokio::time::sleep(Duration::from_secs(2)).await;

    // ==== Stage 5: Stop and report ====
    tracing::info!("Shutting down...");
    match controller.stop().await? {
        Some(stats) => println!("{stats}"),
        None => tracing::warn!("Pipeline was not running"),
    }

    Ok(())
}

fn create_test_config() -> IngestConfig {
    IngestConfig {
        version: ConfigVersion::V1,
        device: DeviceConfig {
            port: "mock://thermometer".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 50,
            read_buffer_size: 1024,
        },
        queue: QueueConfig {
            capacity: 16,
            policy: BackpressurePolicy::Block,
        },
        sink: SinkConfig {
            name: "console".to_string(),
            sink_type: SinkType::Log,
            params: HashMap::new(),
        },
    }
}
