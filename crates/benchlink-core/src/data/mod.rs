//! Data models for telemetry samples, status events, and commands
//!
//! This module provides:
//! - The canonical decoded telemetry record ([`Sample`])
//! - Device status events ([`StatusEvent`])
//! - Raw frame classification ([`Frame`], [`FrameKind`], [`Decoded`])
//! - Outgoing command representation ([`Command`], [`ParamSet`])
//! - Connection lifecycle states ([`ConnectionState`])

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully decoded telemetry record.
///
/// One `Sample` corresponds to one accepted telemetry frame. Optional
/// fields are `None` when a wire-format variant omits them; a `Sample` is
/// only ever constructed from a complete parse, so partially parsed data
/// never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since session start when the frame was accepted
    pub timestamp_s: f64,
    /// Commanded throttle in percent
    pub throttle_pct: Option<f64>,
    /// Measured thrust in grams
    pub thrust_g: Option<f64>,
    /// Motor speed in revolutions per minute
    pub rpm: Option<u32>,
    /// Motor current draw in amperes
    pub current_a: Option<f64>,
    /// Ambient temperature in degrees Celsius
    pub ambient_temp_c: Option<f64>,
    /// Object (motor/ESC) temperature in degrees Celsius
    pub object_temp_c: Option<f64>,
}

impl Sample {
    /// Enumerate the readings present in this sample as (label, value)
    /// pairs, in a stable order. RPM is widened to f64 for uniformity.
    ///
    /// This is the shape consumed by downstream log sinks, which append
    /// one row per reading.
    pub fn readings(&self) -> Vec<(&'static str, f64)> {
        let mut rows = Vec::with_capacity(6);
        if let Some(v) = self.throttle_pct {
            rows.push(("Throttle", v));
        }
        if let Some(v) = self.thrust_g {
            rows.push(("Thrust", v));
        }
        if let Some(v) = self.rpm {
            rows.push(("RPM", v as f64));
        }
        if let Some(v) = self.current_a {
            rows.push(("Current", v));
        }
        if let Some(v) = self.ambient_temp_c {
            rows.push(("AmbientTemp", v));
        }
        if let Some(v) = self.object_temp_c {
            rows.push(("ObjectTemp", v));
        }
        rows
    }
}

/// Classification of a raw input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameKind {
    /// A telemetry frame carrying numeric readings
    Telemetry,
    /// A device status or setup message
    Status,
    /// A line the decoder could not classify
    Unknown,
}

/// One raw line read from the device, tagged with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// The raw line, trimmed of the trailing newline
    pub raw: String,
    /// Classification of the line
    pub kind: FrameKind,
}

/// Why a line failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownReason {
    /// A telemetry frame with fewer usable fields than required
    Incomplete,
    /// A telemetry frame with a field that failed numeric parsing
    ParseError,
    /// A line matching neither telemetry nor any status marker
    Unrecognized,
}

impl UnknownReason {
    /// Short diagnostic label
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownReason::Incomplete => "incomplete",
            UnknownReason::ParseError => "parse-error",
            UnknownReason::Unrecognized => "unrecognized",
        }
    }
}

/// Kind of device status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    /// The motor has come to a stop
    MotorStopped,
    /// The firmware is ramping the motor down
    MotorStoppingGradually,
    /// The firmware acknowledged a speed change, in percent
    SpeedAdjusted(u8),
    /// A boot/calibration diagnostic line
    Setup(String),
}

/// A decoded non-telemetry device message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// What the device reported
    pub kind: StatusKind,
    /// The raw line as received
    pub raw: String,
}

/// Total decoding result for one input line.
///
/// Exactly one variant per line; the decoder never raises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decoded {
    /// A complete telemetry sample
    Sample(Sample),
    /// A recognized status message
    Status(StatusEvent),
    /// An unusable line, retained with its diagnostic reason
    Unknown {
        /// The raw line as received
        raw: String,
        /// Why decoding failed
        reason: UnknownReason,
    },
}

impl Decoded {
    /// The frame classification of this result
    pub fn kind(&self) -> FrameKind {
        match self {
            Decoded::Sample(_) => FrameKind::Telemetry,
            Decoded::Status(_) => FrameKind::Status,
            Decoded::Unknown { .. } => FrameKind::Unknown,
        }
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No link; the handle is released
    Disconnected,
    /// A connect is in progress (port opening / settle window)
    Connecting,
    /// Link is up and polls are trusted
    Connected,
    /// A fatal I/O failure occurred; awaiting explicit reconnect
    Error,
}

impl ConnectionState {
    /// Check if this state holds an open transport handle
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }

    /// Check if a `connect()` call is legal from this state
    pub fn can_connect(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Error)
    }

    /// Check if a transition from this state to `target` is valid.
    ///
    /// - `Disconnected` can only go to `Connecting`
    /// - `Connecting` can go to `Connected`, `Error`, or back to `Disconnected`
    /// - `Error` can go to `Connecting` (user-initiated reconnect) or
    ///   `Disconnected`; never straight to `Connected`
    /// - Any state can go to `Disconnected` (disconnect is always safe)
    pub fn can_transition_to(&self, target: ConnectionState) -> bool {
        use ConnectionState::*;
        if *self == target {
            return true;
        }
        match (self, target) {
            (_, Disconnected) => true,
            (Disconnected | Error, Connecting) => true,
            (Disconnected | Error, _) => false,
            (Connecting, Connected | Error) => true,
            (Connecting, _) => false,
            (Connected, Error) => true,
            (Connected, _) => false,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error => write!(f, "error"),
        }
    }
}

/// Winding direction for the stator winding controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindDirection {
    /// Clockwise, encoded as `1` on the wire
    Clockwise,
    /// Counter-clockwise, encoded as `0` on the wire
    CounterClockwise,
}

impl WindDirection {
    /// The single-digit wire encoding
    pub fn wire_digit(&self) -> u8 {
        match self {
            WindDirection::Clockwise => 1,
            WindDirection::CounterClockwise => 0,
        }
    }
}

/// Winding-machine parameter set, in wire order.
///
/// Field order matches the `P,...` parameter frame consumed by the
/// controller firmware; [`crate::data::Command::UpdateParameters`] joins
/// these with commas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    /// Winding motor speed in steps/s
    pub wind_speed: f64,
    /// Feed motor speed in steps/s
    pub feed_speed: f64,
    /// Rotation motor speed in steps/s
    pub rotation_speed: f64,
    /// Winding motor steps per revolution
    pub wind_steps_per_rev: u32,
    /// Feed motor steps per revolution
    pub feed_steps_per_rev: u32,
    /// Rotation motor steps per revolution
    pub rotation_steps_per_rev: u32,
    /// Gear ratio between winding motor and spindle
    pub gear_ratio: f64,
    /// Winding direction
    pub direction: WindDirection,
    /// Number of coils per stator slot
    pub coils_per_slot: u32,
    /// Slot length in millimeters
    pub slot_length_mm: f64,
}

impl Default for ParamSet {
    fn default() -> Self {
        Self {
            wind_speed: 1000.0,
            feed_speed: 500.0,
            rotation_speed: 200.0,
            wind_steps_per_rev: 200,
            feed_steps_per_rev: 200,
            rotation_steps_per_rev: 200,
            gear_ratio: 2.5,
            direction: WindDirection::Clockwise,
            coils_per_slot: 100,
            slot_length_mm: 50.0,
        }
    }
}

/// An outgoing motor-control command.
///
/// Commands are validated by the encoder before any bytes reach the
/// wire; see `benchlink-communication`'s protocol module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Discrete speed level 0-9 (legacy thrust-bench firmware)
    SetSpeedLevel(u8),
    /// Speed percentage 10-100
    SetSpeedPercent(u8),
    /// Stop the motor
    Stop,
    /// Home all axes (winding controller)
    Home,
    /// Hard stop, bypasses the gradual ramp-down (winding controller)
    EmergencyStop,
    /// Push a full winding parameter set
    UpdateParameters(ParamSet),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetSpeedLevel(n) => write!(f, "speed level {}", n),
            Command::SetSpeedPercent(p) => write!(f, "speed {}%", p),
            Command::Stop => write!(f, "stop"),
            Command::Home => write!(f, "home"),
            Command::EmergencyStop => write!(f, "emergency stop"),
            Command::UpdateParameters(_) => write!(f, "update parameters"),
        }
    }
}
