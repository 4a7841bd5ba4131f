//! IngestConfig - Config Loader output
//!
//! Describes the full pipeline configuration: device, queue and sink.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Serial device settings
    pub device: DeviceConfig,

    /// Hand-off queue settings
    #[serde(default)]
    pub queue: QueueConfig,

    /// Persistence sink
    pub sink: SinkConfig,
}

/// Serial device settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Platform-specific device name (e.g. "/dev/ttyUSB0", "COM3")
    pub port: String,

    /// Line speed
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Blocking read timeout; bounds how long `stop()` waits for the reader
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Size of the read buffer
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_read_timeout_ms() -> u64 {
    1000
}

fn default_read_buffer_size() -> usize {
    1024
}

impl DeviceConfig {
    /// Create device settings with default timeout and buffer size
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            read_timeout_ms: default_read_timeout_ms(),
            read_buffer_size: default_read_buffer_size(),
        }
    }

    /// Read timeout as a `Duration`
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Policy applied when the ingestion queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Block the reader until the sink worker frees a slot
    #[default]
    Block,
    /// Evict the oldest queued reading and log a warning
    DropOldest,
}

/// Hand-off queue settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of queued readings
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Policy when full
    #[serde(default)]
    pub policy: BackpressurePolicy,
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            policy: BackpressurePolicy::default(),
        }
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON-lines file output
    File,
}
