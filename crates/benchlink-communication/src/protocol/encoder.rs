//! Outgoing command encoding
//!
//! Pure validation + rendering of [`Command`] values onto the wire.
//! Out-of-range commands fail with [`CommandError`] before any write is
//! attempted, so an invalid command is never transmitted.

use benchlink_core::{Command, CommandError, ParamSet};

/// Validate and encode a command into its wire line (newline included).
pub fn encode(command: &Command) -> Result<Vec<u8>, CommandError> {
    let line = match command {
        Command::SetSpeedLevel(n) => {
            if *n > 9 {
                return Err(CommandError::SpeedLevelOutOfRange(*n));
            }
            format!("{}\n", n)
        }
        Command::SetSpeedPercent(p) => {
            if !(10..=100).contains(p) {
                return Err(CommandError::SpeedPercentOutOfRange(*p));
            }
            format!("{}%\n", p)
        }
        Command::Stop => "S\n".to_string(),
        Command::Home => "H\n".to_string(),
        Command::EmergencyStop => "E\n".to_string(),
        Command::UpdateParameters(params) => {
            validate_params(params)?;
            format!(
                "P,{},{},{},{},{},{},{},{},{},{}\n",
                params.wind_speed,
                params.feed_speed,
                params.rotation_speed,
                params.wind_steps_per_rev,
                params.feed_steps_per_rev,
                params.rotation_steps_per_rev,
                params.gear_ratio,
                params.direction.wire_digit(),
                params.coils_per_slot,
                params.slot_length_mm,
            )
        }
    };
    Ok(line.into_bytes())
}

fn validate_params(params: &ParamSet) -> Result<(), CommandError> {
    let positive_f64 = [
        ("wind_speed", params.wind_speed),
        ("feed_speed", params.feed_speed),
        ("rotation_speed", params.rotation_speed),
        ("gear_ratio", params.gear_ratio),
        ("slot_length_mm", params.slot_length_mm),
    ];
    for (name, value) in positive_f64 {
        if !value.is_finite() || value <= 0.0 {
            return Err(CommandError::InvalidParameter {
                name: name.to_string(),
                reason: format!("must be a positive number, got {}", value),
            });
        }
    }

    let positive_u32 = [
        ("wind_steps_per_rev", params.wind_steps_per_rev),
        ("feed_steps_per_rev", params.feed_steps_per_rev),
        ("rotation_steps_per_rev", params.rotation_steps_per_rev),
        ("coils_per_slot", params.coils_per_slot),
    ];
    for (name, value) in positive_u32 {
        if value == 0 {
            return Err(CommandError::InvalidParameter {
                name: name.to_string(),
                reason: "must be nonzero".to_string(),
            });
        }
    }

    Ok(())
}
