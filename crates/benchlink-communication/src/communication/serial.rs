//! Serial port communication implementation
//!
//! Provides serial port enumeration and the real [`Transport`] backed by
//! the `serialport` crate. Reads use a short timeout so the poll loop is
//! never held up waiting for data.

use super::{ConnectionParams, Transport};
use benchlink_core::ConnectionError;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// Serial number if available
    pub serial_number: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

/// List available serial ports on the system.
///
/// Simple enumeration only; no attempt is made to identify the bench
/// device beyond the USB metadata the OS reports.
pub fn list_ports() -> Result<Vec<SerialPortInfo>, ConnectionError> {
    match serialport::available_ports() {
        Ok(ports) => Ok(ports
            .iter()
            .map(|port| {
                let mut info = SerialPortInfo {
                    port_name: port.port_name.clone(),
                    description: port_description(port),
                    manufacturer: None,
                    serial_number: None,
                    vid: None,
                    pid: None,
                };
                if let serialport::SerialPortType::UsbPort(usb_info) = &port.port_type {
                    info.vid = Some(usb_info.vid);
                    info.pid = Some(usb_info.pid);
                    info.manufacturer = usb_info.manufacturer.clone();
                    info.serial_number = usb_info.serial_number.clone();
                }
                info
            })
            .collect()),
        Err(e) => {
            tracing::error!("Failed to enumerate serial ports: {}", e);
            Err(ConnectionError::Io {
                reason: format!("Failed to enumerate ports: {}", e),
            })
        }
    }
}

/// Get a user-friendly description for a port
fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Real serial transport using the serialport crate
pub struct SerialTransport {
    port: Option<Box<dyn serialport::SerialPort>>,
    port_name: String,
}

impl SerialTransport {
    /// Create a transport with no open port
    pub fn new() -> Self {
        Self {
            port: None,
            port_name: String::new(),
        }
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SerialTransport {
    fn connect(&mut self, params: &ConnectionParams) -> Result<(), ConnectionError> {
        let builder = serialport::new(&params.port, params.baud_rate)
            .timeout(Duration::from_millis(params.timeout_ms));

        match builder.open() {
            Ok(port) => {
                self.port = Some(port);
                self.port_name = params.port.clone();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                Err(map_open_error(&params.port, e))
            }
        }
    }

    fn disconnect(&mut self) {
        self.port = None;
        self.port_name.clear();
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port not open"))?;
        let written = port.write(data)?;
        port.flush()?;
        Ok(written)
    }

    fn receive(&mut self) -> io::Result<Vec<u8>> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port not open"))?;

        let available = port
            .bytes_to_read()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        if available == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; available.min(4096) as usize];
        match port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> String {
        if self.port_name.is_empty() {
            "serial".to_string()
        } else {
            self.port_name.clone()
        }
    }
}

/// Map a serialport open failure onto the connection error taxonomy
fn map_open_error(port: &str, e: serialport::Error) -> ConnectionError {
    match e.kind() {
        serialport::ErrorKind::NoDevice => ConnectionError::PortNotFound {
            port: port.to_string(),
        },
        serialport::ErrorKind::Io(io::ErrorKind::NotFound) => ConnectionError::PortNotFound {
            port: port.to_string(),
        },
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => ConnectionError::PortInUse {
            port: port.to_string(),
        },
        _ => ConnectionError::FailedToOpen {
            port: port.to_string(),
            reason: e.to_string(),
        },
    }
}
