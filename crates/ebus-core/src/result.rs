//! Schedule result record
//!
//! A plain, serializable snapshot of a solved charging schedule. It holds the
//! assigned value of every decision variable plus echoes of the static inputs
//! (stations, trip tables, windows) so that it can be reported on, persisted,
//! and fed back as the seed of a rolling-horizon recalculation without access
//! to the model that produced it.

use serde::{Deserialize, Serialize};

use crate::config::FormulationMethod;
use crate::model::{BusKey, StationId};
use crate::window::CleanEnergyWindow;
use crate::{SchedError, SchedResult};

/// Assigned decision values for one bus, indexed by stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSchedule {
    pub key: BusKey,
    pub stops: Vec<StationId>,
    pub scheduled_arrival: Vec<f64>,
    pub arrival: Vec<f64>,
    pub deviation: Vec<f64>,
    /// Battery capacity on arrival (kWh)
    pub capacity: Vec<f64>,
    /// Charge time (hours)
    pub charge_time: Vec<f64>,
    /// Energy gained (kWh)
    pub charge_amount: Vec<f64>,
    pub charge: Vec<bool>,
    /// Non-renewable share of the energy gained (kWh)
    pub non_renewable: Vec<f64>,
    /// Arrives before the horizon end (SPM only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ase: Option<Vec<bool>>,
    /// Discounted energy (SPM only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Vec<f64>>,
    /// Time charged from each window, `[stop][window]`
    pub clean_charge_time: Vec<Vec<f64>>,
    /// Whether each window was used, `[stop][window]`
    pub clean_window_charge: Vec<Vec<bool>>,
}

impl BusSchedule {
    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn total_charge_amount(&self) -> f64 {
        self.charge_amount.iter().sum()
    }

    pub fn total_non_renewable(&self) -> f64 {
        self.non_renewable.iter().sum()
    }

    pub fn charge_count(&self) -> usize {
        self.charge.iter().filter(|&&c| c).count()
    }

    /// Whether every per-stop field has one entry per stop.
    pub fn is_consistent(&self) -> bool {
        let n = self.stops.len();
        [
            self.scheduled_arrival.len(),
            self.arrival.len(),
            self.deviation.len(),
            self.capacity.len(),
            self.charge_time.len(),
            self.charge_amount.len(),
            self.charge.len(),
            self.non_renewable.len(),
            self.clean_charge_time.len(),
            self.clean_window_charge.len(),
        ]
        .iter()
        .all(|&len| len == n)
            && self.ase.as_ref().map_or(true, |v| v.len() == n)
            && self.discount.as_ref().map_or(true, |v| v.len() == n)
    }
}

/// Outcome of the cross-bus exclusivity indicators for one stop pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConflictRecord {
    pub station: StationId,
    pub bus_a: BusKey,
    pub stop_a: usize,
    pub bus_b: BusKey,
    pub stop_b: usize,
    /// Both buses charge at this stop pair
    pub same_stop: bool,
    /// Ordering "a after b" is relaxed
    pub release_a_after_b: bool,
    /// Ordering "b after a" is relaxed
    pub release_b_after_a: bool,
}

/// Energy and charge totals over a set of stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyTotals {
    /// Energy gained (kWh)
    pub energy: f64,
    /// Non-renewable energy (kWh)
    pub non_clean: f64,
    pub charges: usize,
}

/// Clean energy drawn from one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowUsage {
    pub window: CleanEnergyWindow,
    /// Buses that drew a non-zero amount, in key order
    pub per_bus: Vec<(BusKey, f64)>,
    pub total: f64,
}

impl WindowUsage {
    pub fn remaining(&self) -> f64 {
        self.window.available_energy - self.total
    }
}

/// Complete solved schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub method: FormulationMethod,
    /// Station names, by station index
    pub stations: Vec<String>,
    /// Charging station plan the schedule was computed for
    pub charging_stations: Vec<bool>,
    /// Per-bus schedules ordered by bus key
    pub buses: Vec<BusSchedule>,
    pub trip_cost: Vec<Vec<f64>>,
    pub trip_time: Vec<Vec<f64>>,
    pub windows: Vec<CleanEnergyWindow>,
    /// Energy drawn, `[window][bus][stop]` with buses in the order of `buses`
    pub window_energy_used: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    pub station_conflicts: Vec<StationConflictRecord>,
}

impl ScheduleResult {
    /// Check that per-stop arrays line up, e.g. after reading a persisted record.
    pub fn validate(&self) -> SchedResult<()> {
        if let Some(bus) = self.buses.iter().find(|b| !b.is_consistent()) {
            return Err(SchedError::data(format!(
                "schedule for bus {} has per-stop fields of differing lengths",
                bus.key
            )));
        }
        if self.window_energy_used.len() != self.windows.len() {
            return Err(SchedError::data(format!(
                "schedule has {} windows but energy usage for {}",
                self.windows.len(),
                self.window_energy_used.len()
            )));
        }
        Ok(())
    }

    pub fn bus(&self, key: BusKey) -> Option<&BusSchedule> {
        self.buses.iter().find(|b| b.key == key)
    }

    /// Names of the stations with a charger installed.
    pub fn installed_stations(&self) -> Vec<&str> {
        self.stations
            .iter()
            .zip(&self.charging_stations)
            .filter(|(_, &installed)| installed)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Totals over stops whose actual arrival lies within `[start, end]`.
    pub fn horizon_totals(&self, start: f64, end: f64) -> EnergyTotals {
        let mut totals = EnergyTotals::default();
        for bus in &self.buses {
            for i in 0..bus.num_stops() {
                if bus.arrival[i] >= start && bus.arrival[i] <= end {
                    totals.energy += bus.charge_amount[i];
                    totals.non_clean += bus.non_renewable[i];
                    totals.charges += usize::from(bus.charge[i]);
                }
            }
        }
        totals
    }

    /// Totals over every stop of every bus.
    pub fn totals(&self) -> EnergyTotals {
        self.buses.iter().fold(EnergyTotals::default(), |acc, bus| EnergyTotals {
            energy: acc.energy + bus.total_charge_amount(),
            non_clean: acc.non_clean + bus.total_non_renewable(),
            charges: acc.charges + bus.charge_count(),
        })
    }

    /// Clean energy drawn from window `k`, per bus.
    pub fn window_usage(&self, k: usize) -> Option<WindowUsage> {
        let window = *self.windows.get(k)?;
        let per_stop = self.window_energy_used.get(k)?;

        let mut per_bus = Vec::new();
        let mut total = 0.0;
        for (bus, used) in self.buses.iter().zip(per_stop) {
            let amount: f64 = used.iter().sum();
            total += amount;
            if amount != 0.0 {
                per_bus.push((bus.key, amount));
            }
        }

        Some(WindowUsage {
            window,
            per_bus,
            total,
        })
    }
}
