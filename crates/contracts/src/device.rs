//! Device abstraction - the acquisition side of the pipeline
//!
//! A `DeviceConnector` acquires a `DeviceStream` from a `DeviceConfig`.
//! Real serial ports, scripted in-memory devices and capture-file replays
//! all sit behind the same pair of traits.

use std::io::Read;

use crate::{ContractError, DeviceConfig};

/// Connection state of a device handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No handle held
    #[default]
    Closed,
    /// Handle acquired, reads allowed
    Open,
    /// Last open attempt failed
    Failed,
}

/// An open, blocking byte stream.
///
/// `read` follows `std::io::Read` semantics with one addition: a read that
/// times out without data returns `ErrorKind::TimedOut` (or `WouldBlock`)
/// and is not fatal. `Ok(0)` is treated as a read that produced no data;
/// a vanished device reports `BrokenPipe`, `NotConnected` or `UnexpectedEof`.
pub trait DeviceStream: Read + Send {
    /// Human-readable name of the underlying device (port path, capture file, ...)
    fn device_name(&self) -> &str;
}

/// Acquires device streams
pub trait DeviceConnector: Send + Sync {
    /// Open the device described by `config`
    ///
    /// # Errors
    /// Returns a device error (`DeviceNotFound`, `PermissionDenied`,
    /// `UnsupportedBaudRate`, `DeviceOpen`) describing why the device
    /// could not be acquired.
    fn connect(&self, config: &DeviceConfig) -> Result<Box<dyn DeviceStream>, ContractError>;
}

impl<C: DeviceConnector + ?Sized> DeviceConnector for std::sync::Arc<C> {
    fn connect(&self, config: &DeviceConfig) -> Result<Box<dyn DeviceStream>, ContractError> {
        (**self).connect(config)
    }
}
