//! Charging station plan file.
//!
//! One `0`/`1` flag per station, in station order, separated by commas,
//! whitespace or newlines: `1,0,0,1` or `1 0 0 1`.

use std::io::Read;
use std::path::Path;

use ebus_core::{ChargingPlan, SchedError, SchedResult};
use tracing::debug;

use crate::{in_file, open};

/// Read the charging plan from `path`.
pub fn read_charging_plan(path: &Path) -> SchedResult<ChargingPlan> {
    let mut text = String::new();
    open(path)?.read_to_string(&mut text)?;
    let plan = parse_charging_plan(&text).map_err(|e| in_file(path, e))?;
    debug!(
        stations = plan.as_slice().len(),
        installed = plan.installed_count(),
        "loaded charging plan"
    );
    Ok(plan)
}

/// Parse a charging plan from text.
pub fn parse_charging_plan(text: &str) -> SchedResult<ChargingPlan> {
    let flags = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| match token {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(SchedError::Parse(format!(
                "charging plan entry '{}' is not 0 or 1",
                other
            ))),
        })
        .collect::<SchedResult<Vec<bool>>>()?;

    if flags.is_empty() {
        return Err(SchedError::Parse("charging plan is empty".into()));
    }
    Ok(ChargingPlan::new(flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators() {
        let plan = parse_charging_plan("1,0, 0\n1\n").unwrap();
        assert_eq!(plan.as_slice(), &[true, false, false, true]);
        assert_eq!(plan.installed_count(), 2);
    }

    #[test]
    fn test_rejects_other_values() {
        assert!(parse_charging_plan("1,2,0").is_err());
        assert!(parse_charging_plan(" \n").is_err());
    }
}
