//! LifecycleController - start/stop state machine for one device

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{DeviceConfig, DeviceConnector, IngestConfig, QueueConfig, ReadingSink};
use ingestion::{IngestionError, IngestionMetrics, IngestionQueue, PortReader, ReaderExit};
use persistence::SinkWorker;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::error::LifecycleError;
use crate::state::ControllerState;
use crate::stats::RunStats;

/// How often `stop` checks for a dead sink worker while joining the reader
const WORKER_CHECK_INTERVAL: Duration = Duration::from_millis(50);

type ReaderOutcome = (PortReader, Result<ReaderExit, IngestionError>);

/// Tasks and shared state of a running acquisition
struct ActiveRun<S> {
    stop: Arc<AtomicBool>,
    queue: IngestionQueue,
    reader: JoinHandle<ReaderOutcome>,
    worker: SinkWorker<S>,
    metrics: Arc<IngestionMetrics>,
    started_at: Instant,
}

/// Controls acquisition from one device into one sink.
///
/// The sink is handed in at construction and reused across runs. Stopping
/// guarantees the device handle is released and no save happens afterwards.
pub struct LifecycleController<S> {
    device: DeviceConfig,
    queue: QueueConfig,
    connector: Arc<dyn DeviceConnector>,
    sink: Option<S>,
    state: ControllerState,
    run: Option<ActiveRun<S>>,
}

impl<S: ReadingSink + Send + 'static> LifecycleController<S> {
    pub fn new(
        device: DeviceConfig,
        queue: QueueConfig,
        connector: impl DeviceConnector + 'static,
        sink: S,
    ) -> Self {
        Self {
            device,
            queue,
            connector: Arc::new(connector),
            sink: Some(sink),
            state: ControllerState::Closed,
            run: None,
        }
    }

    /// Build from a loaded configuration
    pub fn from_config(
        config: &IngestConfig,
        connector: impl DeviceConnector + 'static,
        sink: S,
    ) -> Self {
        Self::new(config.device.clone(), config.queue.clone(), connector, sink)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn device_config(&self) -> &DeviceConfig {
        &self.device
    }

    /// Whether the reader is still acquiring. False after an unexpected
    /// reader exit even though the controller stays Running.
    pub fn is_acquiring(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.reader.is_finished())
    }

    /// Live ingestion counters of the current run
    pub fn ingestion_metrics(&self) -> Option<ingestion::MetricsSnapshot> {
        self.run.as_ref().map(|run| run.metrics.snapshot())
    }

    /// Live sink counters of the current run
    pub fn sink_metrics(&self) -> Option<persistence::MetricsSnapshot> {
        self.run.as_ref().map(|run| run.worker.metrics().snapshot())
    }

    /// Open the device and start the reader and sink worker.
    ///
    /// # Errors
    /// - `AlreadyRunning` unless Closed
    /// - `DeviceOpen` if the device cannot be acquired; the controller is
    ///   Closed again and `start` may be retried
    #[instrument(
        name = "lifecycle_start",
        skip(self),
        fields(port = %self.device.port, baud_rate = self.device.baud_rate)
    )]
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        if self.state != ControllerState::Closed {
            warn!(state = %self.state, "Start rejected");
            return Err(LifecycleError::AlreadyRunning { state: self.state });
        }
        let sink = self.sink.take().ok_or(LifecycleError::SinkUnavailable)?;

        self.state = ControllerState::Opening;
        let metrics = Arc::new(IngestionMetrics::new());
        let reader = PortReader::with_metrics(self.device.clone(), metrics.clone());

        let mut reader = match self.open(reader).await {
            Ok(reader) => reader,
            Err(e) => {
                self.sink = Some(sink);
                self.state = ControllerState::Closed;
                error!(error = %e, "Start failed");
                return Err(e);
            }
        };

        let queue = IngestionQueue::with_metrics(self.queue.clone(), metrics.clone());
        let worker = SinkWorker::spawn(sink, queue.consumer());
        let stop = Arc::new(AtomicBool::new(false));

        let reader_stop = stop.clone();
        let reader_queue = queue.clone();
        let reader_task = tokio::task::spawn_blocking(move || {
            let exit = reader.run(&reader_stop, &reader_queue);
            match &exit {
                Ok(exit) if !exit.is_requested() && !reader_stop.load(Ordering::Acquire) => {
                    error!(
                        exit = %exit,
                        "Acquisition ended unexpectedly, waiting for stop"
                    );
                }
                Err(e) => error!(error = %e, "Acquisition could not run"),
                _ => {}
            }
            (reader, exit)
        });

        self.run = Some(ActiveRun {
            stop,
            queue,
            reader: reader_task,
            worker,
            metrics,
            started_at: Instant::now(),
        });
        self.state = ControllerState::Running;

        info!(
            capacity = self.queue.capacity,
            policy = ?self.queue.policy,
            "Acquisition started"
        );
        Ok(())
    }

    /// Open the device off the async runtime
    async fn open(&self, mut reader: PortReader) -> Result<PortReader, LifecycleError> {
        let connector = self.connector.clone();
        let (reader, result) = tokio::task::spawn_blocking(move || {
            let result = reader.open(&*connector);
            (reader, result)
        })
        .await
        .map_err(|e| LifecycleError::Join {
            task: "device open",
            message: e.to_string(),
        })?;

        result.map_err(LifecycleError::DeviceOpen)?;
        Ok(reader)
    }

    /// Stop acquisition and drain the queue into the sink.
    ///
    /// Returns `None` when already Closed. When this returns, the device
    /// handle is closed and the sink is flushed and closed.
    ///
    /// # Errors
    /// `Persistence` if the sink worker panicked; the sink is lost and later
    /// starts fail with `SinkUnavailable`.
    #[instrument(name = "lifecycle_stop", skip(self), fields(port = %self.device.port))]
    pub async fn stop(&mut self) -> Result<Option<RunStats>, LifecycleError> {
        let Some(run) = self.run.take() else {
            return Ok(None);
        };
        self.state = ControllerState::Closing;
        info!("Stopping acquisition");

        let ActiveRun {
            stop,
            queue,
            mut reader,
            worker,
            metrics,
            started_at,
        } = run;

        // 1. Reader observes the flag within one read timeout, unless it is
        //    parked on a full queue whose worker has died
        stop.store(true, Ordering::Release);
        let joined = loop {
            tokio::select! {
                joined = &mut reader => break joined,
                _ = tokio::time::sleep(WORKER_CHECK_INTERVAL), if !queue.is_closed() => {
                    if worker.is_finished() {
                        warn!("Sink worker exited early, closing queue to release the reader");
                        queue.close();
                    }
                }
            }
        };
        let reader_exit = match joined {
            Ok((mut port_reader, exit)) => {
                // 2. Release the device
                port_reader.close();
                match exit {
                    Ok(exit) => Some(exit),
                    Err(e) => Some(ReaderExit::Failed(e.to_string())),
                }
            }
            Err(e) => {
                error!(error = %e, "Reader task panicked");
                Some(ReaderExit::Failed(format!("reader task panicked: {e}")))
            }
        };

        // 3. No more pushes; the worker drains what is left
        queue.close();
        let report = match worker.join().await {
            Ok(report) => report,
            Err(e) => {
                self.state = ControllerState::Closed;
                return Err(e.into());
            }
        };
        self.sink = Some(report.sink);
        self.state = ControllerState::Closed;

        let stats = RunStats::from_parts(
            metrics.snapshot(),
            report.metrics,
            report.summary,
            reader_exit,
            started_at.elapsed(),
        );
        info!(
            parsed = stats.readings_parsed,
            rejected = stats.frames_rejected(),
            saved = stats.saves_succeeded,
            failed = stats.saves_failed,
            dropped = stats.readings_dropped,
            "Acquisition stopped"
        );
        Ok(Some(stats))
    }

    /// Give the sink back, if the controller is Closed
    pub fn into_sink(mut self) -> Option<S> {
        if self.run.is_some() {
            return None;
        }
        self.sink.take()
    }
}

impl<S> Drop for LifecycleController<S> {
    fn drop(&mut self) {
        if let Some(run) = &self.run {
            warn!(port = %self.device.port, "Controller dropped while running");
            run.stop.store(true, Ordering::Release);
            run.queue.close();
        }
    }
}
