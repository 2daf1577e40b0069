//! Error handling for Benchlink
//!
//! Provides error types for each layer of the system:
//! - Connection errors (serial link lifecycle)
//! - Command errors (outgoing command validation)
//! - Buffer errors (time-series ordering violations)
//!
//! All error types use `thiserror` for ergonomic error handling. Decode
//! failures are deliberately NOT represented here: a malformed telemetry
//! line is a normal runtime occurrence and surfaces as
//! [`crate::data::Decoded::Unknown`] rather than an `Err`.

use thiserror::Error;

/// Connection error type
///
/// Represents failures of the serial link lifecycle. `connect()` failures
/// leave the connection `Disconnected`; I/O failures on an active link
/// move it to `Error` until an explicit reconnect.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Port is already in use by another process
    #[error("Port already in use: {port}")]
    PortInUse {
        /// The name of the port that is in use.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// A connect was attempted while a link is already up
    #[error("Already connected; disconnect first")]
    AlreadyConnected,

    /// An operation requiring an active link was attempted without one
    #[error("Not connected")]
    NotConnected,

    /// I/O error on an active link
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },
}

/// Command validation error type
///
/// Raised before encoding; a command that fails validation is never
/// written to the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Speed level outside the firmware's 0-9 range
    #[error("Speed level {0} out of range (0-9)")]
    SpeedLevelOutOfRange(u8),

    /// Speed percentage outside the firmware's 10-100 range
    #[error("Speed percentage {0} out of range (10-100)")]
    SpeedPercentOutOfRange(u8),

    /// A winding parameter failed validation
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// The reason the parameter is invalid.
        reason: String,
    },
}

/// Time-series buffer error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    /// A point older than the channel tail was offered
    #[error("Out-of-order timestamp on '{channel}': last={last}, offered={offered}")]
    Ordering {
        /// The channel that rejected the point.
        channel: String,
        /// Timestamp of the channel's newest point.
        last: f64,
        /// Timestamp of the rejected point.
        offered: f64,
    },

    /// The named channel was never registered
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}

/// Main error type for Benchlink
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Command error
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Buffer error
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a command validation error
    pub fn is_command_error(&self) -> bool {
        matches!(self, Error::Command(_))
    }

    /// Check if this is a buffer ordering error
    pub fn is_buffer_error(&self) -> bool {
        matches!(self, Error::Buffer(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
