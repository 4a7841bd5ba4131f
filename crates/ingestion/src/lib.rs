//! # Ingestion Pipeline
//!
//! Acquisition side of the temperature pipeline.
//!
//! Responsibilities:
//! - Acquire a device through a `DeviceConnector` (serial, scripted, replay)
//! - Read raw chunks on a blocking thread until stopped
//! - Parse chunks into `TemperatureReading`s, rejecting noise
//! - Hand readings to the sink side through a bounded `IngestionQueue`
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionQueue, PortReader, SerialConnector};
//! use std::sync::atomic::AtomicBool;
//!
//! let queue = IngestionQueue::new(config.queue.clone());
//! let mut reader = PortReader::new(config.device.clone());
//! reader.open(&SerialConnector::new())?;
//!
//! let stop = AtomicBool::new(false);
//! let exit = reader.run(&stop, &queue)?;
//! ```

mod config;
pub mod device;
mod error;
pub mod parser;
mod queue;
mod reader;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use contracts::{RawChunk, TemperatureReading};
pub use device::{
    available_ports, DeviceProbe, PortSummary, ReplayConfig, ReplayConnector, ScriptedConnector,
    SerialConnector,
};
pub use error::{FrameError, IngestionError, Result};
pub use parser::{parse, parse_frame};
pub use queue::{IngestionQueue, PushOutcome};
pub use reader::{PortReader, ReaderExit};
