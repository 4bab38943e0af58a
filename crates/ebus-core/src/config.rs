//! Scheduler configuration
//!
//! The scheduler is driven by a flat string-keyed map (every value is a decimal
//! or a plain string), which is what command lines and configuration files
//! naturally produce. [`SchedulerConfig::from_map`] parses and validates the
//! map once; the formulation code only ever sees typed fields.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::window::{parse_cew_spec, CleanEnergyWindow};
use crate::{SchedError, SchedResult};

/// Configuration keys understood by [`SchedulerConfig::from_map`].
pub mod keys {
    pub const DEVIATION_TIME: &str = "deviationTime";
    pub const MAX_CHARGE_TIME: &str = "maxChargeTime";
    pub const MIN_CHARGE_TIME: &str = "minChargeTime";
    pub const CHARGE_RATE: &str = "chargeRate";
    pub const MAX_BATTERY_CAPACITY: &str = "maxBatteryCapacity";
    pub const MIN_BATTERY_CAPACITY: &str = "minBatteryCapacity";
    pub const STARTING_CAPACITY: &str = "startingCapacity";
    pub const BUS_ENERGY_COST: &str = "busEnergyCost";
    pub const BUS_SPEED: &str = "busSpeed";
    pub const BIG_M: &str = "bigM";
    pub const HORIZON_START_TIME: &str = "horizonStartTime";
    pub const HORIZON_END_TIME: &str = "horizonEndTime";
    pub const DISCOUNT_FACTOR: &str = "discountFactor";
    pub const METHOD: &str = "method";
    pub const RECALCULATE: &str = "recalculate";
    pub const MAX_SOLUTIONS: &str = "maxSolutions";
    pub const TIMEOUT: &str = "timeout";
    pub const POWER_RATIO: &str = "powerRatio";
    pub const CEW: &str = "CEW";
    pub const TIME_WINDOWS: &str = "timeWindows";
}

/// Formulation variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulationMethod {
    /// Base model
    #[default]
    Default,
    /// Adds the horizon-boundary discount logic
    Spm,
}

impl FormulationMethod {
    pub fn is_spm(&self) -> bool {
        matches!(self, FormulationMethod::Spm)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormulationMethod::Default => "default",
            FormulationMethod::Spm => "SPM",
        }
    }
}

impl fmt::Display for FormulationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormulationMethod {
    type Err = SchedError;

    /// `"SPM"` selects the SPM variant; any other value selects the base model.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim() == "SPM" {
            Ok(FormulationMethod::Spm)
        } else {
            Ok(FormulationMethod::Default)
        }
    }
}

/// Typed, validated scheduler configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Maximum deviation from the timetable (hours)
    pub deviation_time: f64,
    /// Longest single charge (hours)
    pub max_charge_time: f64,
    /// Shortest single charge (hours)
    pub min_charge_time: f64,
    /// Charger output (kWh per hour)
    pub charge_rate: f64,
    pub max_battery_capacity: f64,
    pub min_battery_capacity: f64,
    /// Battery level at the first stop of every bus (kWh)
    pub starting_capacity: f64,
    /// Energy per km travelled (kWh/km)
    pub bus_energy_cost: f64,
    /// Average bus speed (km/h)
    pub bus_speed: f64,
    /// Big-M constant for disjunctive constraints
    pub big_m: f64,
    /// Checkpoint time; decisions at or before it are pinned on recalculation
    pub horizon_start_time: f64,
    /// End of the current horizon (SPM discount boundary)
    pub horizon_end_time: f64,
    /// Fraction of a post-horizon charge that may be discounted (SPM)
    pub discount_factor: f64,
    pub method: FormulationMethod,
    /// Re-solve mid-operation against a prior result
    pub recalculate: bool,
    /// Solver solution-count cap (None = unlimited)
    pub max_solutions: Option<u32>,
    /// Solver wall-clock limit in seconds (None = unlimited)
    pub timeout_seconds: Option<u64>,
    /// Scale applied to CEW amounts
    pub power_ratio: f64,
    /// Parsed clean energy windows, in specification order
    pub windows: Vec<CleanEnergyWindow>,
}

impl SchedulerConfig {
    /// Parse and validate a configuration map.
    pub fn from_map(map: &HashMap<String, String>) -> SchedResult<Self> {
        let power_ratio = optional_f64(map, keys::POWER_RATIO, 1.0)?;

        let cew_spec = match (map.get(keys::CEW), map.get(keys::TIME_WINDOWS)) {
            (Some(cew), Some(_)) => {
                warn!(
                    "both '{}' and '{}' are set; using '{}'",
                    keys::CEW,
                    keys::TIME_WINDOWS,
                    keys::CEW
                );
                Some(cew)
            }
            (Some(cew), None) => Some(cew),
            (None, Some(windows)) => Some(windows),
            (None, None) => None,
        };
        let windows = match cew_spec {
            Some(spec) => parse_cew_spec(spec, power_ratio)?,
            None => Vec::new(),
        };

        let config = Self {
            deviation_time: required_f64(map, keys::DEVIATION_TIME)?,
            max_charge_time: required_f64(map, keys::MAX_CHARGE_TIME)?,
            min_charge_time: required_f64(map, keys::MIN_CHARGE_TIME)?,
            charge_rate: required_f64(map, keys::CHARGE_RATE)?,
            max_battery_capacity: required_f64(map, keys::MAX_BATTERY_CAPACITY)?,
            min_battery_capacity: required_f64(map, keys::MIN_BATTERY_CAPACITY)?,
            starting_capacity: required_f64(map, keys::STARTING_CAPACITY)?,
            bus_energy_cost: required_f64(map, keys::BUS_ENERGY_COST)?,
            bus_speed: required_f64(map, keys::BUS_SPEED)?,
            big_m: required_f64(map, keys::BIG_M)?,
            horizon_start_time: required_f64(map, keys::HORIZON_START_TIME)?,
            horizon_end_time: required_f64(map, keys::HORIZON_END_TIME)?,
            discount_factor: optional_f64(map, keys::DISCOUNT_FACTOR, 0.0)?,
            method: map
                .get(keys::METHOD)
                .map(|m| m.parse::<FormulationMethod>())
                .transpose()?
                .unwrap_or_default(),
            recalculate: map
                .get(keys::RECALCULATE)
                .is_some_and(|v| v.trim() == "true"),
            max_solutions: optional_limit(map, keys::MAX_SOLUTIONS)?
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
            timeout_seconds: optional_limit(map, keys::TIMEOUT)?,
            power_ratio,
            windows,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges. Called by [`SchedulerConfig::from_map`]; callers
    /// that build a config by hand should call it too.
    pub fn validate(&self) -> SchedResult<()> {
        let positive = [
            (keys::CHARGE_RATE, self.charge_rate),
            (keys::MAX_CHARGE_TIME, self.max_charge_time),
            (keys::BUS_SPEED, self.bus_speed),
            (keys::BIG_M, self.big_m),
            (keys::POWER_RATIO, self.power_ratio),
        ];
        for (key, value) in positive {
            if value <= 0.0 {
                return Err(SchedError::config(format!(
                    "{} must be positive, got {}",
                    key, value
                )));
            }
        }

        let non_negative = [
            (keys::DEVIATION_TIME, self.deviation_time),
            (keys::MIN_CHARGE_TIME, self.min_charge_time),
            (keys::BUS_ENERGY_COST, self.bus_energy_cost),
            (keys::DISCOUNT_FACTOR, self.discount_factor),
            (keys::MIN_BATTERY_CAPACITY, self.min_battery_capacity),
        ];
        for (key, value) in non_negative {
            if value < 0.0 {
                return Err(SchedError::config(format!(
                    "{} must not be negative, got {}",
                    key, value
                )));
            }
        }

        if self.min_charge_time > self.max_charge_time {
            return Err(SchedError::config(format!(
                "{} ({}) exceeds {} ({})",
                keys::MIN_CHARGE_TIME,
                self.min_charge_time,
                keys::MAX_CHARGE_TIME,
                self.max_charge_time
            )));
        }
        if self.min_battery_capacity > self.max_battery_capacity {
            return Err(SchedError::config(format!(
                "{} ({}) exceeds {} ({})",
                keys::MIN_BATTERY_CAPACITY,
                self.min_battery_capacity,
                keys::MAX_BATTERY_CAPACITY,
                self.max_battery_capacity
            )));
        }
        if self.starting_capacity < self.min_battery_capacity
            || self.starting_capacity > self.max_battery_capacity
        {
            return Err(SchedError::config(format!(
                "{} ({}) must lie within [{}, {}]",
                keys::STARTING_CAPACITY,
                self.starting_capacity,
                self.min_battery_capacity,
                self.max_battery_capacity
            )));
        }
        if self.horizon_start_time > self.horizon_end_time {
            return Err(SchedError::config(format!(
                "{} ({}) is after {} ({})",
                keys::HORIZON_START_TIME,
                self.horizon_start_time,
                keys::HORIZON_END_TIME,
                self.horizon_end_time
            )));
        }
        Ok(())
    }

    /// Largest energy a single charge can deliver (kWh).
    pub fn max_charge_amount(&self) -> f64 {
        self.max_charge_time * self.charge_rate
    }

    /// Scheduled-time distance within which two buses may contend for a charger.
    pub fn conflict_span(&self) -> f64 {
        2.0 * (self.max_charge_time + self.deviation_time)
    }
}

fn required_f64(map: &HashMap<String, String>, key: &str) -> SchedResult<f64> {
    let raw = map
        .get(key)
        .ok_or_else(|| SchedError::config(format!("missing required key '{}'", key)))?;
    parse_f64(key, raw)
}

fn optional_f64(map: &HashMap<String, String>, key: &str, default: f64) -> SchedResult<f64> {
    match map.get(key) {
        Some(raw) => parse_f64(key, raw),
        None => Ok(default),
    }
}

/// Non-negative integer limit where `0` means "no limit".
fn optional_limit(map: &HashMap<String, String>, key: &str) -> SchedResult<Option<u64>> {
    let Some(raw) = map.get(key) else {
        return Ok(None);
    };
    let value: i64 = raw.trim().parse().map_err(|_| {
        SchedError::config(format!("'{}' must be an integer, got '{}'", key, raw))
    })?;
    if value < 0 {
        return Err(SchedError::config(format!(
            "'{}' must not be negative, got {}",
            key, value
        )));
    }
    Ok((value > 0).then_some(value as u64))
}

fn parse_f64(key: &str, raw: &str) -> SchedResult<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| SchedError::config(format!("'{}' must be a number, got '{}'", key, raw)))?;
    if !value.is_finite() {
        return Err(SchedError::config(format!("'{}' must be finite", key)));
    }
    Ok(value)
}
