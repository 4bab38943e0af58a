//! Clean energy windows
//!
//! A clean energy window (CEW) is a half-open interval `[start, end)` during
//! which a capped amount of surplus low-carbon energy may be drawn by any bus
//! charging inside it. Windows arrive on the configuration map as a compact
//! specification string:
//!
//! ```text
//! 10.5-12=300,13-14.25=120,
//! └┬─┘ └┬┘ └┬┘
//! start end amount (scaled by powerRatio)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{SchedError, SchedResult};

/// A time interval with a capped amount of surplus clean energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanEnergyWindow {
    /// Window opening, hour-of-day decimal
    pub start_time: f64,
    /// Window close, hour-of-day decimal (exclusive)
    pub end_time: f64,
    /// Energy available across all buses (kWh), already scaled by the power ratio
    pub available_energy: f64,
}

impl CleanEnergyWindow {
    pub fn new(start_time: f64, end_time: f64, available_energy: f64) -> Self {
        Self {
            start_time,
            end_time,
            available_energy,
        }
    }

    /// Window length in hours
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether a stop scheduled at `scheduled` can structurally reach this window.
    ///
    /// A stop may arrive at most `deviation` early and charge until at most
    /// `2 * (deviation + max_charge_time)` after its scheduled time. Windows
    /// entirely outside that reach get no decision variables.
    pub fn reachable_from(&self, scheduled: f64, deviation: f64, max_charge_time: f64) -> bool {
        !(self.end_time < scheduled - deviation
            || self.start_time > scheduled + 2.0 * (deviation + max_charge_time))
    }
}

/// Parse a CEW specification string of the form `start-end=amount,...`.
///
/// Entries with a zero amount are dropped. Amounts are multiplied by
/// `power_ratio`. Empty segments (including the one after the terminating
/// comma) are ignored.
pub fn parse_cew_spec(spec: &str, power_ratio: f64) -> SchedResult<Vec<CleanEnergyWindow>> {
    let mut windows = Vec::new();

    for (position, segment) in spec.split(',').enumerate() {
        let entry = segment.trim();
        if entry.is_empty() {
            continue;
        }

        let (range, amount) = entry.split_once('=').ok_or_else(|| {
            SchedError::config(format!(
                "CEW entry {} ('{}') is missing '=amount'",
                position + 1,
                entry
            ))
        })?;
        let (start, end) = range.split_once('-').ok_or_else(|| {
            SchedError::config(format!(
                "CEW entry {} ('{}') is missing 'start-end'",
                position + 1,
                entry
            ))
        })?;

        let start_time = parse_number(start, "start", entry)?;
        let end_time = parse_number(end, "end", entry)?;
        let amount = parse_number(amount, "amount", entry)?;

        if amount < 0.0 {
            return Err(SchedError::config(format!(
                "CEW entry '{}' has a negative amount",
                entry
            )));
        }
        if start_time >= end_time {
            return Err(SchedError::config(format!(
                "CEW entry '{}' must start before it ends",
                entry
            )));
        }
        if amount == 0.0 {
            debug!(start_time, end_time, "dropping clean energy window with no energy");
            continue;
        }

        windows.push(CleanEnergyWindow::new(
            start_time,
            end_time,
            amount * power_ratio,
        ));
    }

    Ok(windows)
}

fn parse_number(raw: &str, field: &str, entry: &str) -> SchedResult<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        SchedError::config(format!(
            "CEW entry '{}' has an invalid {} value '{}'",
            entry,
            field,
            raw.trim()
        ))
    })?;
    if !value.is_finite() {
        return Err(SchedError::config(format!(
            "CEW entry '{}' has a non-finite {} value",
            entry, field
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terminated_spec() {
        let windows = parse_cew_spec("10.5-12=300,13-14.25=120,", 1.0).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0], CleanEnergyWindow::new(10.5, 12.0, 300.0));
        assert_eq!(windows[1], CleanEnergyWindow::new(13.0, 14.25, 120.0));
    }

    #[test]
    fn test_zero_amount_is_dropped() {
        let windows = parse_cew_spec("8-9=0,9-10=50,", 1.0).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_time, 9.0);
    }

    #[test]
    fn test_power_ratio_scales_amount() {
        let windows = parse_cew_spec("8-9=200,", 0.25).unwrap();
        assert!((windows[0].available_energy - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_unterminated_final_entry_is_kept() {
        let windows = parse_cew_spec("8-9=10,9-10=20", 1.0).unwrap();
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn test_malformed_entries_are_config_errors() {
        for spec in ["8-9,", "8=10,", "a-9=10,", "9-8=10,", "8-9=-1,", "8-8=5,"] {
            let err = parse_cew_spec(spec, 1.0).unwrap_err();
            assert!(matches!(err, SchedError::Config(_)), "{spec} -> {err}");
        }
    }

    #[test]
    fn test_reachability_window() {
        let window = CleanEnergyWindow::new(10.0, 11.0, 100.0);
        // ends before 11.5 - 0.25
        assert!(!window.reachable_from(11.5, 0.25, 0.5));
        // starts after 8.0 + 2 * 0.75
        assert!(!window.reachable_from(8.0, 0.25, 0.5));
        assert!(window.reachable_from(9.0, 0.25, 0.5));
        assert!(window.reachable_from(11.2, 0.25, 0.5));
    }
}
