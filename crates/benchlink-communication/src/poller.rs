//! Periodic poll scheduling and telemetry routing
//!
//! The [`TelemetryPoller`] owns the read side of the system: a cancellable
//! tokio task ticks at a fixed period, drains every complete line the
//! connection manager has buffered, and routes the decoded results into
//! the time-series buffers, the session timer, registered sample sinks,
//! and the link event channel. All lines of one tick are processed before
//! the next tick starts, so samples are buffered in wire arrival order.
//!
//! The poller is independent of any rendering framework; display code
//! subscribes to events or reads the buffers.

use crate::manager::ConnectionManager;
use crate::protocol::decoder::FrameDecoder;
use benchlink_core::{
    buffer::{ChannelMode, ChannelPoint, TimeSeriesBuffer},
    timer::SessionTimer,
    Decoded, LinkEvent, Sample, SampleSink, StatusKind, DEFAULT_WINDOW_S,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Channel names the poller feeds.
pub mod channels {
    /// Commanded throttle, percent. Unbounded: x-axis of the scatter view.
    pub const THROTTLE: &str = "throttle";
    /// Thrust, grams. Unbounded: y-axis of the scatter view.
    pub const THRUST: &str = "thrust";
    /// Motor speed, RPM. Windowed.
    pub const RPM: &str = "rpm";
    /// Current draw, amperes. Windowed.
    pub const CURRENT: &str = "current";
    /// Ambient temperature, Celsius. Windowed.
    pub const AMBIENT_TEMP: &str = "ambient_temp";
    /// Object temperature, Celsius. Windowed.
    pub const OBJECT_TEMP: &str = "object_temp";
}

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Tick period in milliseconds
    pub interval_ms: u64,
    /// Display window for the scrolling channels, in seconds
    pub window_s: f64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            window_s: DEFAULT_WINDOW_S,
        }
    }
}

/// Handle returned by [`TelemetryPoller::register_sink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkHandle(String);

struct PollerShared {
    manager: Arc<ConnectionManager>,
    buffers: RwLock<TimeSeriesBuffer>,
    timer: Mutex<SessionTimer>,
    sinks: RwLock<HashMap<String, Arc<dyn SampleSink>>>,
    decoder: FrameDecoder,
    epoch: Instant,
}

impl PollerShared {
    fn handle_line(&self, line: &str, now_s: f64) {
        match self.decoder.decode(line, now_s) {
            Decoded::Sample(sample) => {
                self.append_sample(&sample);
                for sink in self.sinks.read().values() {
                    sink.on_sample(&sample);
                }
                self.manager.dispatcher().publish(LinkEvent::Sample(sample));
            }
            Decoded::Status(status) => {
                let mut timer = self.timer.lock();
                match status.kind {
                    StatusKind::MotorStopped => timer.stop(),
                    StatusKind::SpeedAdjusted(_) => timer.start(),
                    _ => {}
                }
                drop(timer);
                self.manager.dispatcher().publish(LinkEvent::Status(status));
            }
            Decoded::Unknown { raw, reason } => {
                tracing::debug!("Dropping frame ({}): {}", reason.as_str(), raw);
                self.manager
                    .dispatcher()
                    .publish(LinkEvent::UnknownFrame { raw, reason });
            }
        }
    }

    fn append_sample(&self, sample: &Sample) {
        let t = sample.timestamp_s;
        let mut buffers = self.buffers.write();
        let points = [
            (channels::THROTTLE, sample.throttle_pct),
            (channels::THRUST, sample.thrust_g),
            (channels::RPM, sample.rpm.map(f64::from)),
            (channels::CURRENT, sample.current_a),
            (channels::AMBIENT_TEMP, sample.ambient_temp_c),
            (channels::OBJECT_TEMP, sample.object_temp_c),
        ];
        for (channel, value) in points {
            if let Some(v) = value {
                if let Err(e) = buffers.append(channel, t, v) {
                    // Ordering violations never abort the read loop.
                    tracing::warn!("Buffer rejected point: {}", e);
                }
            }
        }
    }
}

/// Drives periodic polls and owns the telemetry state they fill.
pub struct TelemetryPoller {
    shared: Arc<PollerShared>,
    io_task: Option<JoinHandle<()>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl TelemetryPoller {
    /// Register channels, spawn the poll task, and return the handle.
    pub fn start(manager: Arc<ConnectionManager>, config: PollerConfig) -> Self {
        let mut buffers = TimeSeriesBuffer::new();
        let windowed = ChannelMode::Windowed {
            window_s: config.window_s,
        };
        buffers.register(channels::THROTTLE, ChannelMode::Unbounded);
        buffers.register(channels::THRUST, ChannelMode::Unbounded);
        buffers.register(channels::RPM, windowed);
        buffers.register(channels::CURRENT, windowed);
        buffers.register(channels::AMBIENT_TEMP, windowed);
        buffers.register(channels::OBJECT_TEMP, windowed);

        let shared = Arc::new(PollerShared {
            manager,
            buffers: RwLock::new(buffers),
            timer: Mutex::new(SessionTimer::new()),
            sinks: RwLock::new(HashMap::new()),
            decoder: FrameDecoder::new(),
            epoch: Instant::now(),
        });

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let task_shared = shared.clone();
        let period = Duration::from_millis(config.interval_ms.max(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = interval.tick() => {
                        match task_shared.manager.poll() {
                            Ok(lines) => {
                                let now_s = task_shared.epoch.elapsed().as_secs_f64();
                                for line in &lines {
                                    task_shared.handle_line(line, now_s);
                                }
                            }
                            Err(e) => {
                                // The manager has already moved to Error and
                                // published the event; just keep ticking so a
                                // reconnect resumes polling.
                                tracing::warn!("Poll failed: {}", e);
                            }
                        }
                    }
                }
            }
        });

        Self {
            shared,
            io_task: Some(handle),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Stop the poll task. Buffers and timer remain readable.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
        if let Some(handle) = self.io_task.take() {
            handle.abort();
        }
    }

    /// Points inside the trailing display window of a channel
    pub fn window(&self, channel: &str) -> Vec<ChannelPoint> {
        self.shared.buffers.read().window(channel).unwrap_or_default()
    }

    /// The full retained series of a channel
    pub fn series(&self, channel: &str) -> Vec<ChannelPoint> {
        self.shared.buffers.read().all(channel).unwrap_or_default()
    }

    /// Newest point of a channel, if any
    pub fn latest(&self, channel: &str) -> Option<ChannelPoint> {
        self.shared.buffers.read().latest(channel)
    }

    /// Drop all buffered points, keeping channel registrations.
    /// Call after a reconnect to start the charts fresh.
    pub fn clear_buffers(&self) {
        self.shared.buffers.write().clear();
    }

    /// Cumulative motor running time
    pub fn session_elapsed(&self) -> Duration {
        self.shared.timer.lock().elapsed()
    }

    /// Cumulative motor running time as `HH:MM:SS`
    pub fn session_formatted(&self) -> String {
        self.shared.timer.lock().formatted()
    }

    /// Whether the session timer is counting
    pub fn session_running(&self) -> bool {
        self.shared.timer.lock().is_running()
    }

    /// Start the session timer from the control path (user-initiated
    /// speed input), independent of device acknowledgments.
    pub fn session_start(&self) {
        self.shared.timer.lock().start();
    }

    /// Stop the session timer from the control path
    pub fn session_stop(&self) {
        self.shared.timer.lock().stop();
    }

    /// Zero the session timer. Explicit user action only; the timer
    /// otherwise persists across reconnects.
    pub fn session_reset(&self) {
        self.shared.timer.lock().reset();
    }

    /// Register a sink receiving every accepted sample
    pub fn register_sink(&self, sink: Arc<dyn SampleSink>) -> SinkHandle {
        let id = Uuid::new_v4().to_string();
        self.shared.sinks.write().insert(id.clone(), sink);
        SinkHandle(id)
    }

    /// Remove a previously registered sink
    pub fn unregister_sink(&self, handle: SinkHandle) {
        self.shared.sinks.write().remove(&handle.0);
    }

    /// Number of registered sinks
    pub fn sink_count(&self) -> usize {
        self.shared.sinks.read().len()
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
