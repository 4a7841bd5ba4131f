//! MemorySink - keeps readings in memory, for tests and demos

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{ContractError, ReadingSink, TemperatureReading};

/// Sink recording every saved reading.
///
/// Clones share storage, so a test can keep one clone and hand the other to
/// the pipeline. Saves can be made to fail for chosen sequence numbers.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    name: String,
    saved: Arc<Mutex<Vec<TemperatureReading>>>,
    fail_sequences: Arc<HashSet<u64>>,
    delay: Duration,
    closed: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fail saves of readings with these sequence numbers
    pub fn failing_on(mut self, sequences: impl IntoIterator<Item = u64>) -> Self {
        self.fail_sequences = Arc::new(sequences.into_iter().collect());
        self
    }

    /// Sleep before every save
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Readings saved so far, in save order
    pub fn saved(&self) -> Vec<TemperatureReading> {
        self.saved.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Values saved so far
    pub fn values(&self) -> Vec<f64> {
        self.saved().iter().map(|r| r.value).collect()
    }

    /// Whether `close` was called since the last save
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ReadingSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save(&mut self, reading: &TemperatureReading) -> Result<(), ContractError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.closed.store(false, Ordering::SeqCst);

        if self.fail_sequences.contains(&reading.sequence) {
            return Err(ContractError::sink_write(&self.name, "rejected by test sink"));
        }
        self.saved
            .lock()
            .map_err(|_| ContractError::sink_write(&self.name, "storage poisoned"))?
            .push(*reading);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_storage() {
        let observer = MemorySink::new("memory");
        let mut sink = observer.clone();

        sink.save(&TemperatureReading::now(19.0, 0)).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(observer.values(), vec![19.0]);
        assert!(observer.is_closed());
    }

    #[tokio::test]
    async fn test_failing_sequences() {
        let mut sink = MemorySink::new("memory").failing_on([1]);
        assert!(sink.save(&TemperatureReading::now(1.0, 0)).await.is_ok());
        assert!(sink.save(&TemperatureReading::now(2.0, 1)).await.is_err());
        assert_eq!(sink.values(), vec![1.0]);
    }
}
