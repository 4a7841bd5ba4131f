//! Scripted in-memory device
//!
//! Plays a fixed list of chunks, one per read call, then idles, disconnects
//! or fails. Every `connect` starts the script from the beginning.

use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{ContractError, DeviceConfig, DeviceConnector, DeviceStream};

/// What the device does once the script is exhausted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum ScriptEnd {
    /// Keep timing out like a silent port
    #[default]
    Idle,
    /// Report the device as unplugged
    Disconnect,
    /// Report a hard I/O error
    Fail(String),
}

/// Why `connect` should fail
#[derive(Debug, Clone, PartialEq, Eq)]
enum OpenFailure {
    NotFound,
    PermissionDenied,
    UnsupportedBaudRate,
    Busy(String),
}

/// Counts handle acquisitions and releases across connections
#[derive(Debug, Clone, Default)]
pub struct DeviceProbe {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl DeviceProbe {
    /// Handles acquired so far
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Handles released so far
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Read calls across all handles
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Whether a handle is currently held
    pub fn is_open(&self) -> bool {
        self.opens() > self.closes()
    }
}

/// Connector producing scripted devices
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    script: Vec<Bytes>,
    chunk_interval: Duration,
    end: ScriptEnd,
    open_failure: Option<OpenFailure>,
    probe: DeviceProbe,
}

impl ScriptedConnector {
    /// Script of chunks, one returned per read call.
    ///
    /// An empty entry makes that read return `Ok(0)`.
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            script: chunks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Script built from text lines
    pub fn from_lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| Bytes::copy_from_slice(l.as_bytes())))
    }

    /// Pause before each scripted chunk
    pub fn with_chunk_interval(mut self, interval: Duration) -> Self {
        self.chunk_interval = interval;
        self
    }

    /// Report `BrokenPipe` after the last chunk
    pub fn then_disconnect(mut self) -> Self {
        self.end = ScriptEnd::Disconnect;
        self
    }

    /// Report a hard I/O error after the last chunk
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.end = ScriptEnd::Fail(message.into());
        self
    }

    /// Make `connect` fail with `DeviceNotFound`
    pub fn fail_not_found(mut self) -> Self {
        self.open_failure = Some(OpenFailure::NotFound);
        self
    }

    /// Make `connect` fail with `PermissionDenied`
    pub fn fail_permission_denied(mut self) -> Self {
        self.open_failure = Some(OpenFailure::PermissionDenied);
        self
    }

    /// Make `connect` fail with `UnsupportedBaudRate`
    pub fn fail_unsupported_baud_rate(mut self) -> Self {
        self.open_failure = Some(OpenFailure::UnsupportedBaudRate);
        self
    }

    /// Make `connect` fail with a generic open error
    pub fn fail_busy(mut self, message: impl Into<String>) -> Self {
        self.open_failure = Some(OpenFailure::Busy(message.into()));
        self
    }

    /// Probe shared with every device this connector opens
    pub fn probe(&self) -> DeviceProbe {
        self.probe.clone()
    }
}

impl DeviceConnector for ScriptedConnector {
    fn connect(&self, config: &DeviceConfig) -> Result<Box<dyn DeviceStream>, ContractError> {
        if let Some(failure) = &self.open_failure {
            let port = config.port.clone();
            return Err(match failure {
                OpenFailure::NotFound => ContractError::DeviceNotFound { port },
                OpenFailure::PermissionDenied => ContractError::PermissionDenied { port },
                OpenFailure::UnsupportedBaudRate => ContractError::UnsupportedBaudRate {
                    port,
                    baud_rate: config.baud_rate,
                },
                OpenFailure::Busy(message) => ContractError::device_open(port, message.clone()),
            });
        }

        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedDevice {
            name: config.port.clone(),
            script: self.script.clone(),
            cursor: 0,
            pending: Bytes::new(),
            chunk_interval: self.chunk_interval,
            idle_timeout: config.read_timeout(),
            end: self.end.clone(),
            probe: self.probe.clone(),
        }))
    }
}

struct ScriptedDevice {
    name: String,
    script: Vec<Bytes>,
    cursor: usize,
    /// Tail of a chunk larger than the caller's buffer
    pending: Bytes,
    chunk_interval: Duration,
    idle_timeout: Duration,
    end: ScriptEnd,
    probe: DeviceProbe,
}

impl ScriptedDevice {
    fn copy_out(&mut self, mut chunk: Bytes, buf: &mut [u8]) -> usize {
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        self.pending = chunk.split_off(n);
        n
    }
}

impl Read for ScriptedDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.probe.reads.fetch_add(1, Ordering::SeqCst);

        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            return Ok(self.copy_out(pending, buf));
        }

        if let Some(chunk) = self.script.get(self.cursor).cloned() {
            self.cursor += 1;
            if !self.chunk_interval.is_zero() {
                thread::sleep(self.chunk_interval);
            }
            return Ok(self.copy_out(chunk, buf));
        }

        match &self.end {
            ScriptEnd::Idle => {
                thread::sleep(self.idle_timeout);
                Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
            }
            ScriptEnd::Disconnect => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device disconnected",
            )),
            ScriptEnd::Fail(message) => Err(io::Error::other(message.clone())),
        }
    }
}

impl DeviceStream for ScriptedDevice {
    fn device_name(&self) -> &str {
        &self.name
    }
}

impl Drop for ScriptedDevice {
    fn drop(&mut self) {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DeviceConfig {
        let mut config = DeviceConfig::new("scripted", 9600);
        config.read_timeout_ms = 5;
        config
    }

    #[test]
    fn test_plays_script_then_disconnects() {
        let connector = ScriptedConnector::from_lines(&["21.5", "22.0"]).then_disconnect();
        let mut device = connector.connect(&config()).unwrap();
        let mut buf = [0u8; 16];

        assert_eq!(device.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"21.5");
        assert_eq!(device.read(&mut buf).unwrap(), 4);
        let err = device.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_idle_times_out() {
        let connector = ScriptedConnector::from_lines(&[]);
        let mut device = connector.connect(&config()).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(
            device.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::TimedOut
        );
    }

    #[test]
    fn test_large_chunk_split_across_reads() {
        let connector = ScriptedConnector::from_lines(&["123456"]);
        let mut device = connector.connect(&config()).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(device.read(&mut buf).unwrap(), 4);
        assert_eq!(device.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"56");
    }

    #[test]
    fn test_probe_tracks_handles() {
        let connector = ScriptedConnector::from_lines(&["1"]);
        let probe = connector.probe();

        let device = connector.connect(&config()).unwrap();
        assert!(probe.is_open());
        drop(device);
        assert!(!probe.is_open());

        let _again = connector.connect(&config()).unwrap();
        assert_eq!(probe.opens(), 2);
        assert_eq!(probe.closes(), 1);
    }

    #[test]
    fn test_open_failures() {
        let err = ScriptedConnector::default()
            .fail_permission_denied()
            .connect(&config())
            .err()
            .unwrap();
        assert!(matches!(err, ContractError::PermissionDenied { .. }));

        let connector = ScriptedConnector::default().fail_not_found();
        assert!(connector.connect(&config()).is_err());
        assert_eq!(connector.probe().opens(), 0);
    }
}
