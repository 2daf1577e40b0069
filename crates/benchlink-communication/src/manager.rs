//! Connection lifecycle management
//!
//! The [`ConnectionManager`] is the single owner of the transport handle.
//! All reads (polls) and writes go through it and serialize on the
//! transport lock, so a write and a poll can never interleave
//! mid-operation. State follows
//! `Disconnected → Connecting → Connected → Error → Disconnected`;
//! recovery from `Error` is always an explicit disconnect + connect, never
//! an automatic retry.

use crate::communication::{ConnectionParams, Transport};
use benchlink_core::{
    Command, ConnectionError, ConnectionState, EventDispatcher, LinkEvent,
};
use parking_lot::{Mutex, RwLock};
use std::time::Instant;
use tokio::sync::broadcast;

/// Owns the serial handle and its lifecycle state machine.
pub struct ConnectionManager {
    /// The transport, behind the single-owner lock
    transport: Mutex<Box<dyn Transport>>,
    /// Current lifecycle state
    state: RwLock<ConnectionState>,
    /// Parameters of the active connection, if any
    params: RwLock<Option<ConnectionParams>>,
    /// Partial line carried between polls
    rx_tail: Mutex<String>,
    /// End of the device-settle window; polls before this are discarded
    settle_until: RwLock<Option<Instant>>,
    /// Event fan-out
    dispatcher: EventDispatcher,
}

impl ConnectionManager {
    /// Create a manager around a transport
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Mutex::new(transport),
            state: RwLock::new(ConnectionState::Disconnected),
            params: RwLock::new(None),
            rx_tail: Mutex::new(String::new()),
            settle_until: RwLock::new(None),
            dispatcher: EventDispatcher::default(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Parameters of the active connection, if any
    pub fn params(&self) -> Option<ConnectionParams> {
        self.params.read().clone()
    }

    /// Subscribe to link events
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.dispatcher.subscribe()
    }

    /// The event dispatcher, for sharing with other publishers
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Open the link.
    ///
    /// Fails with [`ConnectionError::AlreadyConnected`] unless the manager
    /// is `Disconnected` or `Error` — an existing handle is never silently
    /// replaced. On success the state becomes `Connected` and a settle
    /// window begins, during which polled lines are dropped (the bench
    /// firmware resets and re-runs its calibration when the port opens).
    pub fn connect(&self, params: &ConnectionParams) -> Result<(), ConnectionError> {
        if !self.state().can_connect() {
            return Err(ConnectionError::AlreadyConnected);
        }

        self.set_state(ConnectionState::Connecting);

        let result = {
            let mut transport = self.transport.lock();
            // A reconnect from Error still holds the dead handle; release
            // it before opening the port again.
            transport.disconnect();
            transport.connect(params)
        };
        if let Err(e) = result {
            self.set_state(ConnectionState::Disconnected);
            return Err(e);
        }

        *self.params.write() = Some(params.clone());
        self.rx_tail.lock().clear();
        *self.settle_until.write() = Some(
            Instant::now() + std::time::Duration::from_millis(params.settle_delay_ms),
        );

        self.set_state(ConnectionState::Connected);
        self.dispatcher
            .publish(LinkEvent::Connected(params.port.clone()));
        tracing::info!("Connected to {} at {} baud", params.port, params.baud_rate);
        Ok(())
    }

    /// Close the link. Idempotent and safe from any state, including
    /// mid-write (waits for the transport lock, then releases the handle).
    pub fn disconnect(&self) {
        self.transport.lock().disconnect();
        self.rx_tail.lock().clear();
        *self.settle_until.write() = None;
        *self.params.write() = None;

        if self.state() != ConnectionState::Disconnected {
            self.set_state(ConnectionState::Disconnected);
            self.dispatcher.publish(LinkEvent::Disconnected);
            tracing::info!("Disconnected");
        }
    }

    /// Drain complete lines currently buffered by the transport.
    ///
    /// Non-blocking: returns immediately with zero or more lines. A
    /// partial trailing line is carried to the next poll. Lines arriving
    /// inside the settle window are discarded. A transport read failure
    /// moves the connection to `Error`.
    pub fn poll(&self) -> Result<Vec<String>, ConnectionError> {
        if self.state() != ConnectionState::Connected {
            return Ok(Vec::new());
        }

        let chunk = {
            let mut transport = self.transport.lock();
            match transport.receive() {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(transport);
                    self.mark_error(&format!("read failed: {}", e));
                    return Err(ConnectionError::Io {
                        reason: e.to_string(),
                    });
                }
            }
        };

        let mut tail = self.rx_tail.lock();
        tail.push_str(&String::from_utf8_lossy(&chunk));

        let mut lines = Vec::new();
        while let Some(pos) = tail.find('\n') {
            let line = tail[..pos].trim_end_matches('\r').trim().to_string();
            tail.drain(..=pos);
            if !line.is_empty() {
                lines.push(line);
            }
        }
        drop(tail);

        if self.in_settle_window() {
            if !lines.is_empty() {
                tracing::debug!("Discarding {} line(s) during settle window", lines.len());
            }
            return Ok(Vec::new());
        }

        Ok(lines)
    }

    /// Write raw bytes to the link.
    ///
    /// Fails fast with [`ConnectionError::NotConnected`] unless the state
    /// is `Connected`. A transport failure moves the connection to
    /// `Error` rather than failing silently.
    pub fn write(&self, data: &[u8]) -> Result<(), ConnectionError> {
        if self.state() != ConnectionState::Connected {
            return Err(ConnectionError::NotConnected);
        }

        let result = self.transport.lock().send(data);
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                self.mark_error(&format!("write failed: {}", e));
                Err(ConnectionError::Io {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Validate, encode, and transmit a command.
    ///
    /// Validation failures are reported before any bytes reach the wire.
    pub fn send_command(&self, command: &Command) -> benchlink_core::Result<()> {
        let wire = crate::protocol::encoder::encode(command)?;
        self.write(&wire)?;
        tracing::debug!("Sent command: {}", command);
        Ok(())
    }

    /// Whether the post-connect settle window is still in effect
    pub fn in_settle_window(&self) -> bool {
        self.settle_until
            .read()
            .is_some_and(|until| Instant::now() < until)
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.write();
        debug_assert!(state.can_transition_to(next), "{} -> {}", *state, next);
        if *state != next {
            *state = next;
            drop(state);
            self.dispatcher.publish(LinkEvent::StateChanged(next));
        }
    }

    fn mark_error(&self, reason: &str) {
        tracing::error!("Connection error: {}", reason);
        // A disconnect may have won the race; there is no link left to
        // mark as failed.
        if self.state() == ConnectionState::Disconnected {
            return;
        }
        self.set_state(ConnectionState::Error);
        self.dispatcher.publish(LinkEvent::Error(reason.to_string()));
    }
}
