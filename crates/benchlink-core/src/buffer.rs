//! Per-channel time-series storage with sliding display windows
//!
//! Channels are registered with a mode: windowed channels serve the
//! trailing `W` seconds for scrolling strip charts and may prune old
//! points; unbounded channels retain the full session (thrust-vs-throttle
//! scatter). Points must arrive in non-decreasing timestamp order —
//! display code assumes monotonicity, so out-of-order points are rejected
//! rather than silently reordered.

use crate::error::BufferError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::VecDeque;

/// Default display window in seconds for scrolling channels.
pub const DEFAULT_WINDOW_S: f64 = 10.0;

/// Windowed channels keep this multiple of the window before pruning.
const DEFAULT_RETENTION_MULTIPLE: f64 = 4.0;

/// One point in a channel: (timestamp seconds, value).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelPoint {
    /// Timestamp in seconds since session start
    pub t: f64,
    /// The reading
    pub v: f64,
}

/// Retention mode declared at channel registration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChannelMode {
    /// Serve the trailing `window_s` seconds; prune beyond retention
    Windowed {
        /// The display window in seconds.
        window_s: f64,
    },
    /// Retain every point for the session
    Unbounded,
}

#[derive(Debug)]
struct SeriesChannel {
    mode: ChannelMode,
    points: VecDeque<ChannelPoint>,
}

impl SeriesChannel {
    fn new(mode: ChannelMode) -> Self {
        Self {
            mode,
            points: VecDeque::new(),
        }
    }
}

/// Mapping from channel name to an ordered point sequence.
///
/// Insertion order equals time order; [`TimeSeriesBuffer::append`]
/// enforces this per channel.
#[derive(Debug)]
pub struct TimeSeriesBuffer {
    channels: HashMap<String, SeriesChannel>,
    retention_multiple: f64,
}

impl TimeSeriesBuffer {
    /// Create an empty buffer with the default retention policy
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            retention_multiple: DEFAULT_RETENTION_MULTIPLE,
        }
    }

    /// Override how many windows of history a windowed channel keeps
    /// before pruning. Values below 1.0 are clamped to 1.0 so the
    /// display window itself is never pruned.
    pub fn with_retention_multiple(mut self, multiple: f64) -> Self {
        self.retention_multiple = multiple.max(1.0);
        self
    }

    /// Register a channel. Registering an existing name again is a no-op
    /// and keeps the original mode and contents.
    pub fn register(&mut self, name: impl Into<String>, mode: ChannelMode) {
        self.channels
            .entry(name.into())
            .or_insert_with(|| SeriesChannel::new(mode));
    }

    /// Names of all registered channels, in no particular order
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    /// Append a point to a channel.
    ///
    /// Rejects points older than the channel's newest point with
    /// [`BufferError::Ordering`], leaving the channel unchanged. Equal
    /// timestamps are accepted (two readings in one poll tick share a
    /// clock value).
    pub fn append(&mut self, channel: &str, t: f64, v: f64) -> Result<(), BufferError> {
        let series = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| BufferError::UnknownChannel(channel.to_string()))?;

        if let Some(last) = series.points.back() {
            if t < last.t {
                return Err(BufferError::Ordering {
                    channel: channel.to_string(),
                    last: last.t,
                    offered: t,
                });
            }
        }

        series.points.push_back(ChannelPoint { t, v });

        if let ChannelMode::Windowed { window_s } = series.mode {
            let horizon = t - window_s * self.retention_multiple;
            while series
                .points
                .front()
                .is_some_and(|p| p.t < horizon)
            {
                series.points.pop_front();
            }
        }

        Ok(())
    }

    /// Points within the trailing display window of a channel:
    /// `t ∈ [t_latest − W, t_latest]`. For unbounded channels this is
    /// the full series.
    pub fn window(&self, channel: &str) -> Result<Vec<ChannelPoint>, BufferError> {
        let series = self
            .channels
            .get(channel)
            .ok_or_else(|| BufferError::UnknownChannel(channel.to_string()))?;

        match (series.mode, series.points.back()) {
            (ChannelMode::Windowed { window_s }, Some(latest)) => {
                let start = latest.t - window_s;
                Ok(series
                    .points
                    .iter()
                    .filter(|p| p.t >= start)
                    .copied()
                    .collect())
            }
            _ => Ok(series.points.iter().copied().collect()),
        }
    }

    /// The full retained series of a channel
    pub fn all(&self, channel: &str) -> Result<Vec<ChannelPoint>, BufferError> {
        let series = self
            .channels
            .get(channel)
            .ok_or_else(|| BufferError::UnknownChannel(channel.to_string()))?;
        Ok(series.points.iter().copied().collect())
    }

    /// The newest point of a channel, if any
    pub fn latest(&self, channel: &str) -> Option<ChannelPoint> {
        self.channels
            .get(channel)
            .and_then(|s| s.points.back())
            .copied()
    }

    /// Number of retained points in a channel (0 for unknown channels)
    pub fn len(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, |s| s.points.len())
    }

    /// True when no channel holds any points
    pub fn is_empty(&self) -> bool {
        self.channels.values().all(|s| s.points.is_empty())
    }

    /// Drop all points from every channel, keeping registrations.
    /// Called on reconnect.
    pub fn clear(&mut self) {
        for series in self.channels.values_mut() {
            series.points.clear();
        }
    }
}

impl Default for TimeSeriesBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windowed(window_s: f64) -> TimeSeriesBuffer {
        let mut buf = TimeSeriesBuffer::new();
        buf.register("temp", ChannelMode::Windowed { window_s });
        buf
    }

    #[test]
    fn window_serves_trailing_span() {
        let mut buf = windowed(10.0);
        for t in 0..=15 {
            buf.append("temp", t as f64, t as f64 * 2.0).unwrap();
        }
        let points = buf.window("temp").unwrap();
        assert_eq!(points.first().unwrap().t, 5.0);
        assert_eq!(points.last().unwrap().t, 15.0);
        assert_eq!(points.len(), 11);
    }

    #[test]
    fn out_of_order_rejected_buffer_unchanged() {
        let mut buf = windowed(10.0);
        buf.append("temp", 5.0, 1.0).unwrap();
        let err = buf.append("temp", 4.0, 2.0).unwrap_err();
        assert!(matches!(err, BufferError::Ordering { .. }));
        assert_eq!(buf.len("temp"), 1);
        assert_eq!(buf.latest("temp").unwrap().t, 5.0);
    }

    #[test]
    fn equal_timestamps_accepted() {
        let mut buf = windowed(10.0);
        buf.append("temp", 1.0, 1.0).unwrap();
        buf.append("temp", 1.0, 2.0).unwrap();
        assert_eq!(buf.len("temp"), 2);
    }

    #[test]
    fn unknown_channel_errors() {
        let mut buf = TimeSeriesBuffer::new();
        let err = buf.append("rpm", 0.0, 0.0).unwrap_err();
        assert_eq!(err, BufferError::UnknownChannel("rpm".to_string()));
        assert!(buf.window("rpm").is_err());
    }

    #[test]
    fn windowed_channel_prunes_beyond_retention() {
        let mut buf = windowed(1.0).with_retention_multiple(2.0);
        for t in 0..100 {
            buf.append("temp", t as f64, 0.0).unwrap();
        }
        // Horizon at t=99 is 99 - 1*2 = 97; points 97..=99 survive.
        assert_eq!(buf.len("temp"), 3);
    }

    #[test]
    fn unbounded_channel_retains_everything() {
        let mut buf = TimeSeriesBuffer::new();
        buf.register("thrust_vs_throttle", ChannelMode::Unbounded);
        for t in 0..1000 {
            buf.append("thrust_vs_throttle", t as f64, 0.0).unwrap();
        }
        assert_eq!(buf.len("thrust_vs_throttle"), 1000);
        assert_eq!(buf.all("thrust_vs_throttle").unwrap().len(), 1000);
        // window() on an unbounded channel is the full series
        assert_eq!(buf.window("thrust_vs_throttle").unwrap().len(), 1000);
    }

    #[test]
    fn clear_keeps_registrations() {
        let mut buf = windowed(10.0);
        buf.append("temp", 1.0, 1.0).unwrap();
        buf.clear();
        assert!(buf.is_empty());
        // Channel still registered, so append works again from scratch
        buf.append("temp", 0.5, 1.0).unwrap();
        assert_eq!(buf.len("temp"), 1);
    }
}
