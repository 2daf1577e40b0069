//! Event system for link and telemetry notifications
//!
//! Provides:
//! - [`LinkEvent`], the immutable value published for every state change
//!   and decoded frame
//! - [`EventDispatcher`], a broadcast-based publisher decoupling the poll
//!   loop from whatever renders or logs the data

use crate::data::{ConnectionState, Sample, StatusEvent, UnknownReason};
use tokio::sync::broadcast;

/// Link and telemetry event types
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// A connection was established on the named port
    Connected(String),
    /// The connection was closed
    Disconnected,
    /// Connection state changed
    StateChanged(ConnectionState),
    /// A telemetry sample was accepted
    Sample(Sample),
    /// A status message was decoded
    Status(StatusEvent),
    /// A line could not be decoded
    UnknownFrame {
        /// The raw line as received.
        raw: String,
        /// Why decoding failed.
        reason: UnknownReason,
    },
    /// An I/O or link error occurred
    Error(String),
}

impl std::fmt::Display for LinkEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkEvent::Connected(port) => write!(f, "Connected to {}", port),
            LinkEvent::Disconnected => write!(f, "Disconnected"),
            LinkEvent::StateChanged(state) => write!(f, "State: {}", state),
            LinkEvent::Sample(sample) => write!(f, "Sample at t={:.2}s", sample.timestamp_s),
            LinkEvent::Status(status) => write!(f, "Status: {}", status.raw),
            LinkEvent::UnknownFrame { raw, reason } => {
                write!(f, "Unknown frame ({}): {}", reason.as_str(), raw)
            }
            LinkEvent::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for link events.
    tx: broadcast::Sender<LinkEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 100)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers the event reached; publishing with
    /// no subscribers is not an error.
    pub fn publish(&self, event: LinkEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
