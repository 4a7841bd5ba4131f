//! Build the configured sink

use contracts::{ContractError, ReadingSink, SinkConfig, SinkType, TemperatureReading};
use tracing::instrument;

use crate::error::PersistenceError;
use crate::sinks::{FileSink, LogSink};

/// One of the built-in sinks, chosen by configuration
pub enum ConfiguredSink {
    Log(LogSink),
    File(FileSink),
}

/// Create the sink described by `config`
#[instrument(
    name = "persistence_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink(config: &SinkConfig) -> Result<ConfiguredSink, PersistenceError> {
    match config.sink_type {
        SinkType::Log => Ok(ConfiguredSink::Log(LogSink::new(&config.name))),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| PersistenceError::sink_creation(&config.name, e.to_string()))?;
            Ok(ConfiguredSink::File(sink))
        }
    }
}

impl ReadingSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Log(sink) => sink.name(),
            Self::File(sink) => sink.name(),
        }
    }

    async fn save(&mut self, reading: &TemperatureReading) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.save(reading).await,
            Self::File(sink) => sink.save(reading).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.flush().await,
            Self::File(sink) => sink.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.close().await,
            Self::File(sink) => sink.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sink_config(sink_type: SinkType, params: HashMap<String, String>) -> SinkConfig {
        SinkConfig {
            name: "readings".to_string(),
            sink_type,
            params,
        }
    }

    #[tokio::test]
    async fn test_create_log_sink() {
        let mut sink = create_sink(&sink_config(SinkType::Log, HashMap::new())).unwrap();
        assert!(matches!(sink, ConfiguredSink::Log(_)));
        assert_eq!(sink.name(), "readings");
        sink.save(&TemperatureReading::now(21.0, 0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_file_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let params = HashMap::from([("path".to_string(), path.display().to_string())]);

        let mut sink = create_sink(&sink_config(SinkType::File, params)).unwrap();
        sink.save(&TemperatureReading::now(21.0, 0)).await.unwrap();
        sink.close().await.unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("21.0"));
    }

    #[test]
    fn test_file_sink_without_path_fails() {
        let err = create_sink(&sink_config(SinkType::File, HashMap::new()))
            .err()
            .unwrap();
        assert!(matches!(err, PersistenceError::SinkCreation { .. }));
    }
}
