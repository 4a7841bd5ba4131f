//! SinkWorker - single task draining the ingestion queue into a sink

use std::sync::Arc;

use async_channel::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use contracts::{ReadingSink, TemperatureReading};
use observability::{ReadingStatsAggregator, ReadingSummary};

use crate::error::PersistenceError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// What a finished worker hands back
#[derive(Debug)]
pub struct WorkerReport<S> {
    /// The sink, flushed and closed, ready for another run
    pub sink: S,
    /// Temperatures of every reading the worker popped
    pub summary: ReadingSummary,
    /// Final counters
    pub metrics: MetricsSnapshot,
}

/// Handle to a running sink worker
pub struct SinkWorker<S> {
    name: String,
    metrics: Arc<SinkMetrics>,
    handle: JoinHandle<WorkerReport<S>>,
}

impl<S: ReadingSink + Send + 'static> SinkWorker<S> {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// The worker runs until `rx` is closed and drained.
    pub fn spawn(sink: S, rx: Receiver<TemperatureReading>) -> Self {
        let name = sink.name().to_string();
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();
        let handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await
        });

        Self {
            name,
            metrics,
            handle,
        }
    }

    /// Sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live counters
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Whether the worker has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker to drain the queue and exit.
    ///
    /// The queue must be closed first or this waits forever.
    #[instrument(name = "sink_worker_join", skip(self), fields(sink = %self.name))]
    pub async fn join(self) -> Result<WorkerReport<S>, PersistenceError> {
        let report = self.handle.await.map_err(|e| {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
            PersistenceError::WorkerAborted {
                name: self.name.clone(),
                message: e.to_string(),
            }
        })?;
        debug!(sink = %self.name, "Sink worker joined");
        Ok(report)
    }
}

/// Worker loop: pop, save, repeat; flush and close at the end
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: ReadingSink>(
    mut sink: S,
    rx: Receiver<TemperatureReading>,
    metrics: Arc<SinkMetrics>,
    name: String,
) -> WorkerReport<S> {
    debug!(sink = %name, "Sink worker started");
    let mut aggregator = ReadingStatsAggregator::new();

    while let Ok(reading) = rx.recv().await {
        metrics.set_queue_len(rx.len());
        observability::record_queue_depth(rx.len());
        aggregator.update(&reading);

        match sink.save(&reading).await {
            Ok(()) => {
                metrics.inc_save_count();
                observability::record_reading_saved(&name, true);
            }
            Err(e) => {
                metrics.inc_failure_count();
                observability::record_reading_saved(&name, false);
                error!(
                    sink = %name,
                    sequence = reading.sequence,
                    value = reading.value,
                    error = %e,
                    "Save failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    let snapshot = metrics.snapshot();
    info!(
        sink = %name,
        saved = snapshot.save_count,
        failed = snapshot.failure_count,
        "Sink worker stopped"
    );

    WorkerReport {
        sink,
        summary: aggregator.summary(),
        metrics: snapshot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use async_channel::bounded;
    use tokio::time::Duration;

    fn reading(sequence: u64) -> TemperatureReading {
        TemperatureReading::now(20.0 + sequence as f64, sequence)
    }

    #[tokio::test]
    async fn test_saves_in_order() {
        let observer = MemorySink::new("memory");
        let (tx, rx) = bounded(16);
        let worker = SinkWorker::spawn(observer.clone(), rx);

        for i in 0..5 {
            tx.send(reading(i)).await.unwrap();
        }
        tx.close();

        let report = worker.join().await.unwrap();
        let sequences: Vec<u64> = observer.saved().iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3, 4]);
        assert_eq!(report.metrics.save_count, 5);
        assert_eq!(report.summary.total_readings, 5);
        assert!(observer.is_closed());
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        let observer = MemorySink::new("flaky").failing_on([1]);
        let (tx, rx) = bounded(16);
        let worker = SinkWorker::spawn(observer.clone(), rx);

        for i in 0..3 {
            tx.send(reading(i)).await.unwrap();
        }
        tx.close();

        let report = worker.join().await.unwrap();
        assert_eq!(observer.values(), vec![20.0, 22.0]);
        assert_eq!(report.metrics.save_count, 2);
        assert_eq!(report.metrics.failure_count, 1);
        assert_eq!(report.metrics.attempts(), 3);
    }

    #[tokio::test]
    async fn test_drains_before_exit() {
        let observer = MemorySink::new("slow").with_delay(Duration::from_millis(5));
        let (tx, rx) = bounded(16);
        for i in 0..10 {
            tx.send(reading(i)).await.unwrap();
        }
        tx.close();

        let worker = SinkWorker::spawn(observer.clone(), rx);
        worker.join().await.unwrap();
        assert_eq!(observer.saved().len(), 10);
    }

    #[tokio::test]
    async fn test_sink_returned_for_reuse() {
        let (tx, rx) = bounded(4);
        let worker = SinkWorker::spawn(MemorySink::new("reused"), rx);
        tx.send(reading(0)).await.unwrap();
        tx.close();
        let report = worker.join().await.unwrap();

        let (tx, rx) = bounded(4);
        let worker = SinkWorker::spawn(report.sink, rx);
        tx.send(reading(1)).await.unwrap();
        tx.close();
        let report = worker.join().await.unwrap();
        assert_eq!(report.sink.saved().len(), 2);
    }
}
