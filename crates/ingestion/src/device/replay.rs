//! Replay connector - plays a capture of raw sensor output as a device

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{ContractError, DeviceConfig, DeviceConnector, DeviceStream};
use tracing::{debug, info};

/// Replay settings
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Capture file with raw bytes as the sensor printed them
    pub path: PathBuf,

    /// Bytes returned per read
    pub chunk_size: usize,

    /// Pause before each chunk
    pub interval: Duration,

    /// Start over at end of file instead of reporting end of stream
    pub loop_playback: bool,
}

impl ReplayConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: 16,
            interval: Duration::from_millis(100),
            loop_playback: false,
        }
    }
}

/// Connector that ignores the configured port and replays a capture file
#[derive(Debug, Clone)]
pub struct ReplayConnector {
    config: ReplayConfig,
}

impl ReplayConnector {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }
}

impl DeviceConnector for ReplayConnector {
    fn connect(&self, device: &DeviceConfig) -> Result<Box<dyn DeviceStream>, ContractError> {
        let name = self.config.path.display().to_string();
        let data = fs::read(&self.config.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ContractError::DeviceNotFound { port: name.clone() },
            io::ErrorKind::PermissionDenied => {
                ContractError::PermissionDenied { port: name.clone() }
            }
            _ => ContractError::device_open(name.clone(), e.to_string()),
        })?;

        info!(
            capture = %name,
            bytes = data.len(),
            chunk_size = self.config.chunk_size,
            configured_port = %device.port,
            "Replaying capture file"
        );

        Ok(Box::new(ReplayDevice {
            name,
            data: Bytes::from(data),
            offset: 0,
            chunk_size: self.config.chunk_size.max(1),
            interval: self.config.interval,
            loop_playback: self.config.loop_playback,
        }))
    }
}

struct ReplayDevice {
    name: String,
    data: Bytes,
    offset: usize,
    chunk_size: usize,
    interval: Duration,
    loop_playback: bool,
}

impl Read for ReplayDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.offset >= self.data.len() {
            if !self.loop_playback || self.data.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "end of capture",
                ));
            }
            debug!(capture = %self.name, "Capture exhausted, looping");
            self.offset = 0;
        }

        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }

        let end = (self.offset + self.chunk_size.min(buf.len())).min(self.data.len());
        let n = end - self.offset;
        buf[..n].copy_from_slice(&self.data[self.offset..end]);
        self.offset = end;
        Ok(n)
    }
}

impl DeviceStream for ReplayDevice {
    fn device_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn capture(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    fn connector(file: &NamedTempFile, chunk_size: usize, loop_playback: bool) -> ReplayConnector {
        ReplayConnector::new(ReplayConfig {
            path: file.path().to_path_buf(),
            chunk_size,
            interval: Duration::ZERO,
            loop_playback,
        })
    }

    #[test]
    fn test_replays_in_chunks_then_eof() {
        let file = capture(b"21.50\n22.00\n");
        let mut device = connector(&file, 6, false)
            .connect(&DeviceConfig::new("ignored", 9600))
            .unwrap();
        let mut buf = [0u8; 64];

        assert_eq!(device.read(&mut buf).unwrap(), 6);
        assert_eq!(&buf[..6], b"21.50\n");
        assert_eq!(device.read(&mut buf).unwrap(), 6);
        assert_eq!(
            device.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn test_loops_when_enabled() {
        let file = capture(b"20.0");
        let mut device = connector(&file, 4, true)
            .connect(&DeviceConfig::new("ignored", 9600))
            .unwrap();
        let mut buf = [0u8; 8];

        for _ in 0..3 {
            assert_eq!(device.read(&mut buf).unwrap(), 4);
            assert_eq!(&buf[..4], b"20.0");
        }
    }

    #[test]
    fn test_missing_capture_is_device_not_found() {
        let connector = ReplayConnector::new(ReplayConfig::new("/nonexistent/capture.txt"));
        let err = connector
            .connect(&DeviceConfig::new("ignored", 9600))
            .err()
            .unwrap();
        assert!(matches!(err, ContractError::DeviceNotFound { .. }));
    }
}
