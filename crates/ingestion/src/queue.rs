//! Bounded hand-off between the acquisition thread and the sink worker

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{BackpressurePolicy, QueueConfig, TemperatureReading};
use tracing::{trace, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};

/// Result of a successful push
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PushOutcome {
    /// Reading queued without displacing anything
    Queued,
    /// Queue was full; the returned (oldest) reading was evicted
    Displaced(TemperatureReading),
}

/// Bounded FIFO of readings.
///
/// Cloning yields another handle to the same queue. `push` is meant for the
/// blocking acquisition thread; `pop` for the async consumer.
#[derive(Debug, Clone)]
pub struct IngestionQueue {
    tx: Sender<TemperatureReading>,
    rx: Receiver<TemperatureReading>,
    policy: BackpressurePolicy,
    metrics: Arc<IngestionMetrics>,
}

impl IngestionQueue {
    /// Create a queue with its own metrics
    pub fn new(config: QueueConfig) -> Self {
        Self::with_metrics(config, Arc::new(IngestionMetrics::new()))
    }

    /// Create a queue reporting into shared metrics
    ///
    /// A capacity of zero is bumped to one; `async-channel` rejects
    /// zero-capacity bounded channels.
    pub fn with_metrics(config: QueueConfig, metrics: Arc<IngestionMetrics>) -> Self {
        let (tx, rx) = bounded(config.capacity.max(1));
        Self {
            tx,
            rx,
            policy: config.policy,
            metrics,
        }
    }

    /// Push a reading according to the backpressure policy.
    ///
    /// `Block` waits for a free slot; `DropOldest` evicts the oldest queued
    /// reading instead. Must not be called from inside an async task when
    /// the policy is `Block`.
    ///
    /// # Errors
    /// `QueueClosed` once `close` has been called.
    pub fn push(&self, reading: TemperatureReading) -> Result<PushOutcome> {
        let outcome = match self.policy {
            BackpressurePolicy::Block => self.push_blocking(reading)?,
            BackpressurePolicy::DropOldest => self.push_displacing(reading)?,
        };
        self.metrics.update_queue_len(self.tx.len());
        Ok(outcome)
    }

    fn push_blocking(&self, reading: TemperatureReading) -> Result<PushOutcome> {
        match self.tx.try_send(reading) {
            Ok(()) => Ok(PushOutcome::Queued),
            Err(TrySendError::Full(reading)) => {
                trace!(sequence = reading.sequence, "queue full, waiting for sink worker");
                self.tx
                    .send_blocking(reading)
                    .map_err(|_| IngestionError::QueueClosed)?;
                Ok(PushOutcome::Queued)
            }
            Err(TrySendError::Closed(_)) => Err(IngestionError::QueueClosed),
        }
    }

    fn push_displacing(&self, reading: TemperatureReading) -> Result<PushOutcome> {
        match self.tx.force_send(reading) {
            Ok(None) => Ok(PushOutcome::Queued),
            Ok(Some(evicted)) => {
                self.metrics.record_dropped();
                observability::record_reading_dropped();
                warn!(
                    evicted_sequence = evicted.sequence,
                    evicted_value = evicted.value,
                    capacity = self.capacity(),
                    "Queue full, oldest reading dropped"
                );
                Ok(PushOutcome::Displaced(evicted))
            }
            Err(_) => Err(IngestionError::QueueClosed),
        }
    }

    /// Wait for the next reading; `None` once closed and drained
    pub async fn pop(&self) -> Option<TemperatureReading> {
        let reading = self.rx.recv().await.ok();
        self.metrics.update_queue_len(self.rx.len());
        reading
    }

    /// Receiving end for a dedicated consumer
    pub fn consumer(&self) -> Receiver<TemperatureReading> {
        self.rx.clone()
    }

    /// Stop accepting pushes; queued readings can still be popped.
    ///
    /// Returns `true` if this call closed the queue.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Number of queued readings
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Whether the queue holds no readings
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Maximum number of queued readings
    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }

    /// Policy applied when full
    pub fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    /// Shared metrics
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn queue(capacity: usize, policy: BackpressurePolicy) -> IngestionQueue {
        IngestionQueue::new(QueueConfig { capacity, policy })
    }

    fn reading(sequence: u64) -> TemperatureReading {
        TemperatureReading::now(20.0 + sequence as f64, sequence)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = queue(8, BackpressurePolicy::Block);
        for i in 0..5 {
            assert_eq!(queue.push(reading(i)).unwrap(), PushOutcome::Queued);
        }
        queue.close();

        let mut seen = Vec::new();
        while let Some(r) = queue.pop().await {
            seen.push(r.sequence);
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_drop_oldest_evicts_head() {
        let queue = queue(2, BackpressurePolicy::DropOldest);
        queue.push(reading(0)).unwrap();
        queue.push(reading(1)).unwrap();

        match queue.push(reading(2)).unwrap() {
            PushOutcome::Displaced(evicted) => assert_eq!(evicted.sequence, 0),
            other => panic!("expected displacement, got {other:?}"),
        }
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.metrics().snapshot().readings_dropped, 1);

        assert_eq!(queue.pop().await.map(|r| r.sequence), Some(1));
        assert_eq!(queue.pop().await.map(|r| r.sequence), Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_block_policy_waits_for_consumer() {
        let queue = queue(1, BackpressurePolicy::Block);
        queue.push(reading(0)).unwrap();

        let producer = queue.clone();
        let handle = tokio::task::spawn_blocking(move || {
            // Blocks until the consumer pops reading 0
            producer.push(reading(1)).unwrap();
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        assert_eq!(queue.pop().await.map(|r| r.sequence), Some(0));
        handle.await.unwrap();
        assert_eq!(queue.pop().await.map(|r| r.sequence), Some(1));
        assert_eq!(queue.metrics().snapshot().readings_dropped, 0);
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let queue = queue(4, BackpressurePolicy::Block);
        queue.push(reading(0)).unwrap();
        assert!(queue.close());
        assert!(!queue.close());
        assert!(queue.is_closed());

        assert!(matches!(
            queue.push(reading(1)),
            Err(IngestionError::QueueClosed)
        ));
        assert_eq!(queue.pop().await.map(|r| r.sequence), Some(0));
        assert!(queue.pop().await.is_none());
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let queue = queue(0, BackpressurePolicy::DropOldest);
        assert_eq!(queue.capacity(), 1);
        assert_eq!(queue.policy(), BackpressurePolicy::DropOldest);
    }
}
