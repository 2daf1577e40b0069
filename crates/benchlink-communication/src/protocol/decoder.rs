//! Telemetry frame decoding
//!
//! Turns one raw text line into exactly one [`Decoded`] value. The
//! decoder is total: any input yields `Sample`, `Status`, or `Unknown`,
//! never a panic or an error.
//!
//! Two telemetry wire formats exist in the field. Current firmware emits
//! keyed frames:
//!
//! ```text
//! Throttle:50.0,Thrust:120.5,RPM:8000,Current:3.25,AmbientTemp:25.0,ObjectTemp:40.2
//! ```
//!
//! Older revisions emit a positional frame whose first segment is
//! space-delimited and whose remaining fields sit in a fixed order:
//!
//! ```text
//! Throttle 50, RPM:8000, PulseCount:12, Thrust:120.5, Current:3.25, AmbientTemp:25.0, ObjectTemp:40.2
//! ```
//!
//! Keyed parsing is attempted first because it tolerates field
//! reordering; the positional parse is the fixed-count compatibility
//! fallback. `PulseCount` is accepted in both but its value is discarded.

use crate::protocol::{
    SETUP_MARKERS, STATUS_MOTOR_STOPPED, STATUS_SPEED_ADJUSTED, STATUS_STOPPING_GRADUALLY,
    TELEMETRY_MARKER,
};
use benchlink_core::{Decoded, Frame, Sample, StatusEvent, StatusKind, UnknownReason};

/// Number of readings a telemetry frame must carry to be usable.
const REQUIRED_FIELDS: usize = 6;

/// Decodes raw bench lines into typed frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    /// Create a decoder
    pub fn new() -> Self {
        Self
    }

    /// Decode one line.
    ///
    /// `timestamp_s` is the caller's session clock (seconds since
    /// session start) and is stamped onto any resulting [`Sample`];
    /// decoding itself reads no clocks.
    pub fn decode(&self, line: &str, timestamp_s: f64) -> Decoded {
        let line = line.trim();

        if line.starts_with(TELEMETRY_MARKER) {
            return self.decode_telemetry(line, timestamp_s);
        }

        self.decode_status(line)
    }

    /// Classify a line without keeping the decoded payload.
    pub fn classify(&self, line: &str) -> Frame {
        Frame {
            raw: line.trim().to_string(),
            kind: self.decode(line, 0.0).kind(),
        }
    }

    fn decode_telemetry(&self, line: &str, timestamp_s: f64) -> Decoded {
        let segments: Vec<&str> = line.split(',').collect();

        // Keyed frames have a colon in every segment; the legacy
        // positional frame's first segment ("Throttle 50") does not.
        if segments.iter().all(|s| s.contains(':')) {
            self.decode_keyed(line, &segments, timestamp_s)
        } else {
            self.decode_positional(line, &segments, timestamp_s)
        }
    }

    fn decode_keyed(&self, line: &str, segments: &[&str], timestamp_s: f64) -> Decoded {
        let mut throttle = None;
        let mut thrust = None;
        let mut rpm = None;
        let mut current = None;
        let mut ambient = None;
        let mut object = None;

        for segment in segments {
            let Some((key, value)) = segment.split_once(':') else {
                continue;
            };
            let value = value.trim();

            // Alias table for the fields we keep; PulseCount and unknown
            // keys are skipped without affecting the usable-field count.
            let slot: &mut Option<f64> = match key.trim() {
                "Throttle" => &mut throttle,
                "Thrust" => &mut thrust,
                "Current" => &mut current,
                "AmbientTemp" => &mut ambient,
                "ObjectTemp" => &mut object,
                "RPM" => {
                    match value.parse::<u32>() {
                        Ok(v) => rpm = Some(v),
                        Err(_) => return self.unknown(line, UnknownReason::ParseError),
                    }
                    continue;
                }
                _ => continue,
            };

            match value.parse::<f64>() {
                Ok(v) => *slot = Some(v),
                Err(_) => return self.unknown(line, UnknownReason::ParseError),
            }
        }

        let usable = [throttle, thrust, current, ambient, object]
            .iter()
            .filter(|v| v.is_some())
            .count()
            + usize::from(rpm.is_some());
        if usable < REQUIRED_FIELDS {
            return self.unknown(line, UnknownReason::Incomplete);
        }

        Decoded::Sample(Sample {
            timestamp_s,
            throttle_pct: throttle,
            thrust_g: thrust,
            rpm,
            current_a: current,
            ambient_temp_c: ambient,
            object_temp_c: object,
        })
    }

    /// Fixed field order after the throttle segment:
    /// RPM, PulseCount, Thrust, Current, AmbientTemp, ObjectTemp.
    fn decode_positional(&self, line: &str, segments: &[&str], timestamp_s: f64) -> Decoded {
        if segments.len() < 7 {
            return self.unknown(line, UnknownReason::Incomplete);
        }

        let throttle_str = segments[0].trim_start_matches(TELEMETRY_MARKER).trim();
        let Ok(throttle) = throttle_str.parse::<f64>() else {
            return self.unknown(line, UnknownReason::ParseError);
        };

        let mut values = Vec::with_capacity(6);
        for segment in &segments[1..7] {
            let Some((_, value)) = segment.split_once(':') else {
                return self.unknown(line, UnknownReason::Incomplete);
            };
            values.push(value.trim());
        }

        let Ok(rpm) = values[0].parse::<u32>() else {
            return self.unknown(line, UnknownReason::ParseError);
        };
        // values[1] is PulseCount: it must be numeric for the frame to
        // count as well-formed, but the value itself is unused.
        if values[1].parse::<i64>().is_err() {
            return self.unknown(line, UnknownReason::ParseError);
        }
        let parsed: Result<Vec<f64>, _> = values[2..6].iter().map(|v| v.parse::<f64>()).collect();
        let Ok(parsed) = parsed else {
            return self.unknown(line, UnknownReason::ParseError);
        };

        Decoded::Sample(Sample {
            timestamp_s,
            throttle_pct: Some(throttle),
            thrust_g: Some(parsed[0]),
            rpm: Some(rpm),
            current_a: Some(parsed[1]),
            ambient_temp_c: Some(parsed[2]),
            object_temp_c: Some(parsed[3]),
        })
    }

    /// Ordered status markers; first match wins.
    fn decode_status(&self, line: &str) -> Decoded {
        if line == STATUS_MOTOR_STOPPED {
            return self.status(line, StatusKind::MotorStopped);
        }
        if line == STATUS_STOPPING_GRADUALLY {
            return self.status(line, StatusKind::MotorStoppingGradually);
        }
        if let Some(idx) = line.find(STATUS_SPEED_ADJUSTED) {
            let rest = line[idx + STATUS_SPEED_ADJUSTED.len()..].trim();
            let Some(percent) = rest.strip_suffix('%') else {
                return self.unknown(line, UnknownReason::ParseError);
            };
            return match percent.trim().parse::<u8>() {
                Ok(p) => self.status(line, StatusKind::SpeedAdjusted(p)),
                Err(_) => self.unknown(line, UnknownReason::ParseError),
            };
        }
        if SETUP_MARKERS.iter().any(|m| line.contains(m)) {
            return self.status(line, StatusKind::Setup(line.to_string()));
        }

        self.unknown(line, UnknownReason::Unrecognized)
    }

    fn status(&self, line: &str, kind: StatusKind) -> Decoded {
        Decoded::Status(StatusEvent {
            kind,
            raw: line.to_string(),
        })
    }

    fn unknown(&self, line: &str, reason: UnknownReason) -> Decoded {
        Decoded::Unknown {
            raw: line.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_frame_tolerates_field_reordering() {
        let decoder = FrameDecoder::new();
        let line = "Throttle:50.0,ObjectTemp:40.2,RPM:8000,Thrust:120.5,AmbientTemp:25.0,Current:3.25";
        match decoder.decode(line, 1.0) {
            Decoded::Sample(sample) => {
                assert_eq!(sample.throttle_pct, Some(50.0));
                assert_eq!(sample.object_temp_c, Some(40.2));
                assert_eq!(sample.rpm, Some(8000));
            }
            other => panic!("expected sample, got {:?}", other),
        }
    }

    #[test]
    fn keyed_frame_ignores_pulse_count() {
        let decoder = FrameDecoder::new();
        let line = "Throttle:50.0,Thrust:120.5,RPM:8000,PulseCount:12,Current:3.25,AmbientTemp:25.0,ObjectTemp:40.2";
        assert!(matches!(decoder.decode(line, 0.0), Decoded::Sample(_)));
    }

    #[test]
    fn missing_field_is_incomplete_not_zeroed() {
        let decoder = FrameDecoder::new();
        let line = "Throttle:50.0,Thrust:120.5,RPM:8000,Current:3.25,AmbientTemp:25.0";
        match decoder.decode(line, 0.0) {
            Decoded::Unknown { reason, .. } => assert_eq!(reason, UnknownReason::Incomplete),
            other => panic!("expected unknown, got {:?}", other),
        }
    }
}
