//! FileSink - appends readings to a JSON-lines file

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use contracts::{ContractError, ReadingSink, TemperatureReading};
use tracing::{debug, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file, created if missing and appended to otherwise
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Read config from a params map; `path` is required
    pub fn from_params(params: &HashMap<String, String>) -> std::io::Result<Self> {
        let path = params
            .get("path")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' parameter")
            })?;
        Ok(Self { path })
    }
}

/// Sink that writes one JSON object per reading
///
/// The file is opened at construction. After `close` the next save reopens
/// it in append mode, so a sink can outlive one controller run.
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink, creating parent directories as needed
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let writer = Self::open(&config)?;
        Ok(Self {
            name: name.into(),
            config,
            writer: Some(writer),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params)?;
        Self::new(name, config)
    }

    /// Output path
    pub fn path(&self) -> &PathBuf {
        &self.config.path
    }

    fn open(config: &FileSinkConfig) -> std::io::Result<BufWriter<File>> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;
        Ok(BufWriter::new(file))
    }

    fn write_line(&mut self, reading: &TemperatureReading) -> std::io::Result<()> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => Self::open(&self.config)?,
        };
        let writer = self.writer.insert(writer);
        serde_json::to_writer(&mut *writer, reading)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")
    }
}

impl ReadingSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_save",
        skip(self, reading),
        fields(sink = %self.name, sequence = reading.sequence)
    )]
    async fn save(&mut self, reading: &TemperatureReading) -> Result<(), ContractError> {
        self.write_line(reading)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        debug!(sink = %self.name, path = %self.config.path.display(), "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_appends_json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("readings.jsonl");

        let mut sink = FileSink::new("test_file", FileSinkConfig { path: path.clone() }).unwrap();
        sink.save(&TemperatureReading::now(21.5, 0)).await.unwrap();
        sink.save(&TemperatureReading::now(22.0, 1)).await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["value"], 21.5);
        assert_eq!(lines[1]["sequence"], 1);
        assert!(lines[1]["captured_at"].is_string());
    }

    #[tokio::test]
    async fn test_file_sink_reopens_after_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");

        let mut sink = FileSink::new("reopen", FileSinkConfig { path: path.clone() }).unwrap();
        sink.save(&TemperatureReading::now(20.0, 0)).await.unwrap();
        sink.close().await.unwrap();

        sink.save(&TemperatureReading::now(20.5, 0)).await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_from_params_requires_path() {
        let params = HashMap::new();
        assert!(FileSink::from_params("no_path", &params).is_err());
    }
}
