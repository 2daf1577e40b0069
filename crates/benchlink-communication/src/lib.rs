#![allow(dead_code)]
//! # Benchlink Communication
//!
//! Serial transport, connection lifecycle, and the bench wire protocol.
//! Owns the only code that touches the serial handle: the
//! [`ConnectionManager`] state machine, the [`FrameDecoder`] for incoming
//! telemetry lines, the command encoder for outgoing control lines, and
//! the [`TelemetryPoller`] that drives periodic polls.

pub mod communication;
pub mod manager;
pub mod poller;
pub mod protocol;

pub use communication::{
    serial::{list_ports, SerialPortInfo, SerialTransport},
    ConnectionParams, NoOpTransport, Transport,
};
pub use manager::ConnectionManager;
pub use poller::{channels, PollerConfig, SinkHandle, TelemetryPoller};
pub use protocol::{decoder::FrameDecoder, encoder::encode};
