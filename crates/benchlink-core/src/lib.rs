//! # Benchlink Core
//!
//! Core types and state for the Benchlink telemetry system.
//! Provides the data model shared by every crate in the workspace:
//! decoded telemetry samples, device status events, outgoing commands,
//! connection states, the error taxonomy, time-series buffering, and the
//! motor session timer.

pub mod buffer;
pub mod data;
pub mod error;
pub mod event;
pub mod sink;
pub mod timer;

pub use buffer::{ChannelMode, ChannelPoint, TimeSeriesBuffer, DEFAULT_WINDOW_S};
pub use data::{
    Command, ConnectionState, Decoded, Frame, FrameKind, ParamSet, Sample, StatusEvent,
    StatusKind, UnknownReason, WindDirection,
};
pub use error::{BufferError, CommandError, ConnectionError, Error, Result};
pub use event::{EventDispatcher, LinkEvent};
pub use sink::SampleSink;
pub use timer::SessionTimer;
