//! Transport abstraction over the raw byte link
//!
//! The [`Transport`] trait is the seam between the connection manager and
//! the physical serial port. The real implementation lives in
//! [`serial::SerialTransport`]; [`NoOpTransport`] stands in for tests and
//! offline operation.

pub mod serial;

use benchlink_core::ConnectionError;
use serde::{Deserialize, Serialize};
use std::io;

/// Parameters for opening a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate; observed firmware revisions use 9600, 57600, or 115200
    pub baud_rate: u32,
    /// Read timeout in milliseconds; kept short so polls never block
    pub timeout_ms: u64,
    /// Device-settle delay after open, during which polled lines are
    /// discarded (the bench microcontroller resets when the port opens)
    pub settle_delay_ms: u64,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 57600,
            timeout_ms: 10,
            settle_delay_ms: 2000,
        }
    }
}

impl ConnectionParams {
    /// Convenience constructor with the default timeouts
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Default::default()
        }
    }
}

/// Raw byte link underneath the connection manager.
///
/// Implementations must not block: `receive` returns whatever is
/// currently buffered (possibly nothing) and `send` either completes or
/// fails fast.
pub trait Transport: Send {
    /// Open the link with the given parameters
    fn connect(&mut self, params: &ConnectionParams) -> Result<(), ConnectionError>;

    /// Release the link. Must be safe to call at any time, repeatedly.
    fn disconnect(&mut self);

    /// Whether the link is currently open
    fn is_connected(&self) -> bool;

    /// Write bytes to the link
    fn send(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read whatever bytes are currently available, without waiting
    fn receive(&mut self) -> io::Result<Vec<u8>>;

    /// Human-readable identifier for diagnostics
    fn name(&self) -> String;
}

/// Transport that goes nowhere. Accepts connects and writes, never
/// produces data.
#[derive(Debug, Default)]
pub struct NoOpTransport {
    connected: bool,
}

impl NoOpTransport {
    /// Create a disconnected no-op transport
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for NoOpTransport {
    fn connect(&mut self, _params: &ConnectionParams) -> Result<(), ConnectionError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        Ok(data.len())
    }

    fn receive(&mut self) -> io::Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn name(&self) -> String {
        "noop".to_string()
    }
}
