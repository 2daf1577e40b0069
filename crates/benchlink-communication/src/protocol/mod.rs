//! Bench wire protocol
//!
//! One line per frame, newline-terminated ASCII in both directions.
//! [`decoder`] classifies incoming lines into samples, status events, or
//! unknown frames; [`encoder`] validates and renders outgoing commands.

pub mod decoder;
pub mod encoder;

/// Prefix carried by every telemetry frame, keyed or positional.
pub const TELEMETRY_MARKER: &str = "Throttle";

/// Exact status line: the motor has stopped.
pub const STATUS_MOTOR_STOPPED: &str = "Motor stopped";

/// Exact status line: the firmware is ramping the motor down.
pub const STATUS_STOPPING_GRADUALLY: &str = "Stopping motor gradually";

/// Substring marker for speed acknowledgments.
pub const STATUS_SPEED_ADJUSTED: &str = "Motor speed adjusted to";

/// Setup/calibration diagnostics emitted during firmware boot.
pub const SETUP_MARKERS: [&str; 5] = [
    "Initializing",
    "IR Sensor Test",
    "Calibrating",
    "Voltage offset",
    "Current offset",
];
