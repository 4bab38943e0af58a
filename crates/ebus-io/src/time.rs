//! Clock time conversion.
//!
//! Timetables use `HH:MM` strings; the scheduler works in fractional hours.
//! Midnight (`00:00`) is read as the end of the service day, `24.0`.

use ebus_core::{SchedError, SchedResult};

/// Convert `HH:MM` into fractional hours.
pub fn parse_clock(value: &str) -> SchedResult<f64> {
    let invalid = || SchedError::Parse(format!("invalid clock time '{}', expected HH:MM", value));

    let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.trim().parse().map_err(|_| invalid())?;
    if hours > 24 || minutes >= 60 || (hours == 24 && minutes > 0) {
        return Err(invalid());
    }

    let time = f64::from(hours) + f64::from(minutes) / 60.0;
    Ok(if time == 0.0 { 24.0 } else { time })
}

/// Format fractional hours as `HH:MM`, rounding to the nearest minute.
pub fn format_clock(hours: f64) -> String {
    let total = (hours * 60.0).round().max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
