//! # Benchlink
//!
//! A serial telemetry console for microcontroller-driven test benches:
//! motor/thrust benches and stator-winding controllers. Decodes the
//! heterogeneous line formats the bench firmware has shipped over the
//! years into one canonical sample type, encodes outgoing motor-control
//! commands, and maintains bounded time-series buffers for live display.
//!
//! ## Architecture
//!
//! Benchlink is organized as a workspace with multiple crates:
//!
//! 1. **benchlink-core** - Data model, errors, events, buffers, session timer
//! 2. **benchlink-communication** - Serial transport, connection manager, wire protocol, poller
//! 3. **benchlink-settings** - Configuration files and validation
//! 4. **benchlink** - Headless console binary integrating all crates

pub use benchlink_communication::{
    channels, encode, list_ports, ConnectionManager, ConnectionParams, FrameDecoder,
    NoOpTransport, PollerConfig, SerialPortInfo, SerialTransport, SinkHandle, TelemetryPoller,
    Transport,
};
pub use benchlink_core::{
    BufferError, ChannelMode, ChannelPoint, Command, CommandError, ConnectionError,
    ConnectionState, Decoded, Error, EventDispatcher, Frame, FrameKind, LinkEvent, ParamSet,
    Result, Sample, SampleSink, SessionTimer, StatusEvent, StatusKind, TimeSeriesBuffer,
    UnknownReason, WindDirection,
};
pub use benchlink_settings::{BenchConfig, ConnectionSettings, DisplaySettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with console output, `RUST_LOG` environment
/// variable support, and INFO as the default level.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
