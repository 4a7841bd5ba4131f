//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{BackpressurePolicy, IngestConfig, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Baud rates the common USB-serial bridges support
const STANDARD_BAUD_RATES: &[u32] = &[
    300, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    port: String,
    baud_rate: u32,
    queue_capacity: usize,
    queue_policy: String,
    sink_name: String,
    sink_type: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    port: config.device.port.clone(),
                    baud_rate: config.device.baud_rate,
                    queue_capacity: config.queue.capacity,
                    queue_policy: format!("{:?}", config.queue.policy),
                    sink_name: config.sink.name.clone(),
                    sink_type: format!("{:?}", config.sink.sink_type),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &IngestConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !STANDARD_BAUD_RATES.contains(&config.device.baud_rate) {
        warnings.push(format!(
            "device.baud_rate {} is not a standard rate - the port may reject it",
            config.device.baud_rate
        ));
    }

    if config.device.read_timeout_ms > 5000 {
        warnings.push(format!(
            "device.read_timeout_ms is {} - stopping may take that long",
            config.device.read_timeout_ms
        ));
    }

    if config.queue.policy == BackpressurePolicy::DropOldest && config.queue.capacity < 4 {
        warnings.push(format!(
            "queue.capacity {} with drop_oldest - readings will be dropped whenever the sink stalls",
            config.queue.capacity
        ));
    }

    if config.sink.sink_type == SinkType::Log {
        warnings.push("sink_type is 'log' - readings are logged, not stored".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Port: {} @ {} baud", summary.port, summary.baud_rate);
            println!(
                "  Queue: {} ({})",
                summary.queue_capacity, summary.queue_policy
            );
            println!("  Sink: {} ({})", summary.sink_name, summary.sink_type);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config(toml: &str) -> IngestConfig {
        config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
            .unwrap()
    }

    #[test]
    fn test_warnings_for_risky_settings() {
        let config = config(
            r#"
[device]
port = "/dev/ttyUSB0"
baud_rate = 12345
[queue]
capacity = 1
policy = "drop_oldest"
[sink]
name = "log"
sink_type = "log"
"#,
        );
        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("12345"));
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        let config = config(
            r#"
[device]
port = "/dev/ttyUSB0"
[sink]
name = "readings"
sink_type = "file"
[sink.params]
path = "readings.jsonl"
"#,
        );
        assert!(collect_warnings(&config).is_empty());
    }

    #[test]
    fn test_invalid_file_reported() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[device]\nport = \"\"\n[sink]\nname = \"x\"\nsink_type = \"log\"").unwrap();

        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("device.port"));
    }
}
