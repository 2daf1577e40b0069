//! Cumulative motor run-time tracking
//!
//! The session timer accumulates time while the motor is running and
//! freezes when it stops. It survives reconnects and is only reset by an
//! explicit user action. Starting an already-running timer or stopping an
//! already-stopped one is a no-op.

use std::time::{Duration, Instant};

/// Tracks cumulative running time keyed to motor on/off transitions.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    running: bool,
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl SessionTimer {
    /// Create a stopped timer with zero accumulated time
    pub fn new() -> Self {
        Self {
            running: false,
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    /// Start the timer. No-op if already running.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Stop the timer, folding the live span into the accumulated total.
    /// No-op if already stopped.
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    /// Total accumulated running time
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    /// Whether the timer is currently counting
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reset to zero and stop
    pub fn reset(&mut self) {
        self.running = false;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }

    /// `start()` against an explicit clock reading
    pub fn start_at(&mut self, now: Instant) {
        if !self.running {
            self.started_at = Some(now);
            self.running = true;
        }
    }

    /// `stop()` against an explicit clock reading
    pub fn stop_at(&mut self, now: Instant) {
        if self.running {
            if let Some(started) = self.started_at.take() {
                self.accumulated += now.saturating_duration_since(started);
            }
            self.running = false;
        }
    }

    /// `elapsed()` against an explicit clock reading
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let live = match (self.running, self.started_at) {
            (true, Some(started)) => now.saturating_duration_since(started),
            _ => Duration::ZERO,
        };
        self.accumulated + live
    }

    /// Elapsed time as `HH:MM:SS`
    pub fn formatted(&self) -> String {
        format_hms(self.elapsed())
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a duration as `HH:MM:SS`, truncating sub-second remainder.
pub fn format_hms(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
