//! # Persistence
//!
//! Sink side of the temperature pipeline.
//!
//! Responsibilities:
//! - Drain the ingestion queue on a single worker task
//! - Save readings one at a time, in order
//! - Isolate save failures: log, count, continue
//! - Flush and close the sink once the queue is drained

pub mod error;
pub mod factory;
pub mod metrics;
pub mod sinks;
pub mod worker;

pub use contracts::{ReadingSink, TemperatureReading};
pub use error::PersistenceError;
pub use factory::{create_sink, ConfiguredSink};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, LogSink, MemorySink};
pub use worker::{SinkWorker, WorkerReport};
