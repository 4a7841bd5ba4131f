//! Configuration validation
//!
//! Rules:
//! - device port is non-empty
//! - baud_rate > 0, read timeout > 0, read buffer > 0
//! - queue capacity > 0
//! - sink name is non-empty and required params are present

use contracts::{ContractError, DeviceConfig, IngestConfig, QueueConfig, SinkConfig, SinkType};

/// Validate an IngestConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &IngestConfig) -> Result<(), ContractError> {
    validate_device(&config.device)?;
    validate_queue(&config.queue)?;
    validate_sink(&config.sink)?;
    Ok(())
}

fn validate_device(device: &DeviceConfig) -> Result<(), ContractError> {
    if device.port.trim().is_empty() {
        return Err(ContractError::config_validation(
            "device.port",
            "port must not be empty",
        ));
    }
    if device.baud_rate == 0 {
        return Err(ContractError::config_validation(
            "device.baud_rate",
            "baud_rate must be > 0",
        ));
    }
    if device.read_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "device.read_timeout_ms",
            "read_timeout_ms must be > 0",
        ));
    }
    if device.read_buffer_size == 0 {
        return Err(ContractError::config_validation(
            "device.read_buffer_size",
            "read_buffer_size must be > 0",
        ));
    }
    Ok(())
}

fn validate_queue(queue: &QueueConfig) -> Result<(), ContractError> {
    if queue.capacity == 0 {
        return Err(ContractError::config_validation(
            "queue.capacity",
            "capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_sink(sink: &SinkConfig) -> Result<(), ContractError> {
    if sink.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name must not be empty",
        ));
    }

    match sink.sink_type {
        SinkType::Log => Ok(()),
        SinkType::File => {
            let has_path = sink
                .params
                .get("path")
                .is_some_and(|p| !p.trim().is_empty());
            if has_path {
                Ok(())
            } else {
                Err(ContractError::config_validation(
                    format!("sink[{}].params.path", sink.name),
                    "file sink requires 'path'",
                ))
            }
        }
    }
}
