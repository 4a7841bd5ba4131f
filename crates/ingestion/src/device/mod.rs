//! Device connectors
//!
//! - `SerialConnector`: real serial port (8N1) via `serialport`
//! - `ScriptedConnector`: in-memory chunk script, for tests and demos
//! - `ReplayConnector`: replays a capture file as if it were a port

mod replay;
mod scripted;
mod serial;

pub use replay::{ReplayConfig, ReplayConnector};
pub use scripted::{DeviceProbe, ScriptedConnector};
pub use serial::{available_ports, map_open_error, PortSummary, SerialConnector};
