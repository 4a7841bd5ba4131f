//! Layered error definitions
//!
//! Categorized by source: config / device / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Device Errors =====
    /// Serial device does not exist
    #[error("device not found: {port}")]
    DeviceNotFound { port: String },

    /// Serial device exists but cannot be opened by this user
    #[error("permission denied opening device '{port}'")]
    PermissionDenied { port: String },

    /// Device rejected the requested line settings
    #[error("baud rate {baud_rate} unsupported by device '{port}'")]
    UnsupportedBaudRate { port: String, baud_rate: u32 },

    /// Any other failure while acquiring the device
    #[error("failed to open device '{port}': {message}")]
    DeviceOpen { port: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create generic device open error
    pub fn device_open(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeviceOpen {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised while acquiring a device
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound { .. }
                | Self::PermissionDenied { .. }
                | Self::UnsupportedBaudRate { .. }
                | Self::DeviceOpen { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_messages() {
        let err = ContractError::UnsupportedBaudRate {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 12345,
        };
        assert_eq!(
            err.to_string(),
            "baud rate 12345 unsupported by device '/dev/ttyUSB0'"
        );
        assert!(err.is_device_error());
    }

    #[test]
    fn test_sink_error_is_not_device_error() {
        let err = ContractError::sink_write("db", "connection reset");
        assert!(!err.is_device_error());
        assert!(err.to_string().contains("connection reset"));
    }
}
