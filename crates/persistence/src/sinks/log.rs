//! LogSink - reports each saved reading via tracing

use contracts::{ContractError, ReadingSink, TemperatureReading};
use tracing::{info, instrument};

/// Sink that logs every reading
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ReadingSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_save",
        skip(self, reading),
        fields(sink = %self.name, sequence = reading.sequence)
    )]
    async fn save(&mut self, reading: &TemperatureReading) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            value = reading.value,
            captured_at = %reading.captured_at.to_rfc3339(),
            "Temperature saved"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_save() {
        let mut sink = LogSink::new("test_log");
        let result = sink.save(&TemperatureReading::now(23.5, 0)).await;
        assert!(result.is_ok());
        assert!(sink.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
