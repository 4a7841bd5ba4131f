//! PortReader - blocking acquisition loop
//!
//! Owns the device handle between `open` and `close`. `run` reads chunks
//! until the stop flag is raised or the device goes away, parsing each chunk
//! and pushing readings into the queue. Meant to run on a blocking thread.

use std::io;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use contracts::{ConnectionState, DeviceConfig, DeviceConnector, DeviceStream, RawChunk};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};
use crate::parser::{parse_frame, report_rejection};
use crate::queue::IngestionQueue;

/// Why the acquisition loop returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderExit {
    /// Stop flag observed
    Stopped,
    /// Device unplugged or reached end of stream
    Disconnected,
    /// Hard read error
    Failed(String),
    /// Queue closed underneath the reader
    QueueClosed,
}

impl ReaderExit {
    /// Whether the loop ended because it was asked to
    pub fn is_requested(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl std::fmt::Display for ReaderExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Failed(message) => write!(f, "failed: {message}"),
            Self::QueueClosed => write!(f, "queue closed"),
        }
    }
}

/// Reads raw chunks from one device
pub struct PortReader {
    config: DeviceConfig,
    state: ConnectionState,
    device: Option<Box<dyn DeviceStream>>,
    metrics: Arc<IngestionMetrics>,
    next_sequence: u64,
}

impl PortReader {
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_metrics(config, Arc::new(IngestionMetrics::new()))
    }

    pub fn with_metrics(config: DeviceConfig, metrics: Arc<IngestionMetrics>) -> Self {
        Self {
            config,
            state: ConnectionState::Closed,
            device: None,
            metrics,
            next_sequence: 0,
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Device configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Shared metrics
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Acquire the device.
    ///
    /// Closed/Failed → Open on success, → Failed on error. Opening an
    /// already open reader is a no-op. Chunk sequence restarts at 0.
    ///
    /// # Errors
    /// The connector's device error, unchanged.
    #[instrument(name = "port_reader_open", skip(self, connector), fields(port = %self.config.port, baud_rate = self.config.baud_rate))]
    pub fn open(&mut self, connector: &dyn DeviceConnector) -> Result<ConnectionState> {
        if self.state == ConnectionState::Open {
            debug!("Device already open");
            return Ok(self.state);
        }

        match connector.connect(&self.config) {
            Ok(device) => {
                info!(device = %device.device_name(), "Device opened");
                self.device = Some(device);
                self.state = ConnectionState::Open;
                self.next_sequence = 0;
                Ok(self.state)
            }
            Err(e) => {
                error!(error = %e, "Failed to open device");
                self.state = ConnectionState::Failed;
                Err(IngestionError::Device(e))
            }
        }
    }

    /// Read chunks until stopped, handing each to `on_chunk`.
    ///
    /// Timeouts and zero-byte reads are skipped. `on_chunk` returning
    /// `Break` ends the loop with `QueueClosed`.
    ///
    /// # Errors
    /// `NotOpen` if called before a successful `open`.
    pub fn run_loop<F>(&mut self, stop: &AtomicBool, mut on_chunk: F) -> Result<ReaderExit>
    where
        F: FnMut(RawChunk) -> ControlFlow<()>,
    {
        let Some(device) = self.device.as_mut() else {
            return Err(IngestionError::NotOpen {
                port: self.config.port.clone(),
            });
        };
        let mut buf = vec![0u8; self.config.read_buffer_size.max(1)];

        loop {
            if stop.load(Ordering::Acquire) {
                return Ok(ReaderExit::Stopped);
            }

            match device.read(&mut buf) {
                Ok(0) => {
                    trace!("Empty read");
                }
                Ok(n) => {
                    let chunk = RawChunk::new(self.next_sequence, Bytes::copy_from_slice(&buf[..n]));
                    self.next_sequence += 1;
                    self.metrics.record_chunk(n);
                    observability::record_chunk_received(n);

                    if on_chunk(chunk).is_break() {
                        return Ok(ReaderExit::QueueClosed);
                    }
                }
                Err(e) => match e.kind() {
                    io::ErrorKind::TimedOut
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::Interrupted => {
                        trace!("Read timed out");
                    }
                    io::ErrorKind::BrokenPipe
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::UnexpectedEof => {
                        warn!(error = %e, "Device disconnected");
                        return Ok(ReaderExit::Disconnected);
                    }
                    _ => {
                        error!(error = %e, "Device read failed");
                        return Ok(ReaderExit::Failed(e.to_string()));
                    }
                },
            }
        }
    }

    /// Acquisition loop: read, parse, enqueue.
    ///
    /// # Errors
    /// `NotOpen` if called before a successful `open`.
    #[instrument(name = "port_reader_run", skip_all, fields(port = %self.config.port))]
    pub fn run(&mut self, stop: &AtomicBool, queue: &IngestionQueue) -> Result<ReaderExit> {
        let metrics = self.metrics.clone();
        info!("Acquisition loop started");

        let exit = self.run_loop(stop, |chunk| match parse_frame(&chunk.data, chunk.sequence) {
            Ok(reading) => {
                metrics.record_parsed();
                observability::record_reading_parsed(reading.value);
                match queue.push(reading) {
                    Ok(_) => ControlFlow::Continue(()),
                    Err(_) => ControlFlow::Break(()),
                }
            }
            Err(e) => {
                metrics.record_rejected(&e);
                observability::record_frame_rejected(e.kind());
                report_rejection(&e, chunk.sequence);
                ControlFlow::Continue(())
            }
        })?;

        info!(exit = %exit, chunks = self.next_sequence, "Acquisition loop exited");
        Ok(exit)
    }

    /// Release the device handle. Safe to call when already closed.
    pub fn close(&mut self) {
        if let Some(device) = self.device.take() {
            info!(device = %device.device_name(), "Device closed");
        }
        self.state = ConnectionState::Closed;
    }
}

impl std::fmt::Debug for PortReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortReader")
            .field("port", &self.config.port)
            .field("state", &self.state)
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}
