//! Serial port connector

use std::io::{self, Read};

use contracts::{ContractError, DeviceConfig, DeviceConnector, DeviceStream};
use serde::Serialize;
use serialport::{DataBits, Parity, SerialPort, SerialPortType, StopBits};
use tracing::{debug, info, instrument};

/// Opens real serial ports, 8 data bits, no parity, 1 stop bit
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl SerialConnector {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceConnector for SerialConnector {
    #[instrument(name = "serial_open", skip(self, config), fields(port = %config.port, baud_rate = config.baud_rate))]
    fn connect(&self, config: &DeviceConfig) -> Result<Box<dyn DeviceStream>, ContractError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(config.read_timeout())
            .open()
            .map_err(|e| map_open_error(config, e))?;

        info!(
            port = %config.port,
            baud_rate = config.baud_rate,
            timeout_ms = config.read_timeout_ms,
            "Serial port opened (8N1)"
        );

        Ok(Box::new(SerialDevice {
            name: config.port.clone(),
            port,
        }))
    }
}

/// Map a `serialport` open failure onto the device error taxonomy
pub fn map_open_error(config: &DeviceConfig, error: serialport::Error) -> ContractError {
    let port = config.port.clone();
    match error.kind {
        serialport::ErrorKind::NoDevice => ContractError::DeviceNotFound { port },
        serialport::ErrorKind::Io(io::ErrorKind::NotFound) => ContractError::DeviceNotFound { port },
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            ContractError::PermissionDenied { port }
        }
        serialport::ErrorKind::InvalidInput => ContractError::UnsupportedBaudRate {
            port,
            baud_rate: config.baud_rate,
        },
        _ => ContractError::device_open(port, error.description),
    }
}

struct SerialDevice {
    name: String,
    port: Box<dyn SerialPort>,
}

impl Read for SerialDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl DeviceStream for SerialDevice {
    fn device_name(&self) -> &str {
        &self.name
    }
}

impl Drop for SerialDevice {
    fn drop(&mut self) {
        debug!(port = %self.name, "Serial port closed");
    }
}

/// One entry of the port listing
#[derive(Debug, Clone, Serialize)]
pub struct PortSummary {
    pub port_name: String,
    pub port_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u16>,
}

/// Enumerate serial ports visible to the OS
pub fn available_ports() -> Result<Vec<PortSummary>, ContractError> {
    let ports = serialport::available_ports()
        .map_err(|e| ContractError::Other(format!("failed to enumerate ports: {e}")))?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let (port_type, manufacturer, product, serial_number, vid, pid) = match p.port_type {
                SerialPortType::UsbPort(info) => (
                    "USB",
                    info.manufacturer,
                    info.product,
                    info.serial_number,
                    Some(info.vid),
                    Some(info.pid),
                ),
                SerialPortType::BluetoothPort => ("Bluetooth", None, None, None, None, None),
                SerialPortType::PciPort => ("PCI", None, None, None, None, None),
                SerialPortType::Unknown => ("Unknown", None, None, None, None, None),
            };
            PortSummary {
                port_name: p.port_name,
                port_type: port_type.to_string(),
                manufacturer,
                product,
                serial_number,
                vid,
                pid,
            }
        })
        .collect())
}
