//! Input data model
//!
//! Stations, the inter-station distance matrix, the charging station plan,
//! per-bus timetabled routes and the clean energy windows. A
//! [`ScheduleInput`] is validated once on construction and is immutable for
//! the rest of a run.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::window::CleanEnergyWindow;
use crate::{SchedError, SchedResult};

/// Index of a station, `0..num_stations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationId(pub usize);

impl StationId {
    pub fn new(id: usize) -> Self {
        StationId(id)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

/// Integer key identifying a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusKey(pub i64);

impl BusKey {
    pub fn new(key: i64) -> Self {
        BusKey(key)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BusKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stations with their symmetric distance matrix (km).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationNetwork {
    names: Vec<String>,
    distances: Vec<Vec<f64>>,
}

impl StationNetwork {
    /// Build a network from station names and a full distance matrix.
    ///
    /// The matrix must be square with one row per station, non-negative,
    /// symmetric and zero on the diagonal.
    pub fn new(names: Vec<String>, distances: Vec<Vec<f64>>) -> SchedResult<Self> {
        let n = names.len();
        if distances.len() != n {
            return Err(SchedError::data(format!(
                "distance matrix has {} rows for {} stations",
                distances.len(),
                n
            )));
        }
        if let Some((i, row)) = distances.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(SchedError::data(format!(
                "distance row {} has {} entries for {} stations",
                i,
                row.len(),
                n
            )));
        }
        for (i, row) in distances.iter().enumerate() {
            for (j, &d) in row.iter().enumerate() {
                if !d.is_finite() || d < 0.0 {
                    return Err(SchedError::data(format!(
                        "distance {} -> {} must be a non-negative number, got {}",
                        i, j, d
                    )));
                }
                if i == j && d != 0.0 {
                    return Err(SchedError::data(format!(
                        "distance from station {} to itself must be zero",
                        i
                    )));
                }
                if (d - distances[j][i]).abs() > 1e-9 {
                    return Err(SchedError::data(format!(
                        "distance matrix is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }
        Ok(Self { names, distances })
    }

    pub fn num_stations(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, station: StationId) -> Option<&str> {
        self.names.get(station.0).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn distance(&self, from: StationId, to: StationId) -> f64 {
        self.distances[from.0][to.0]
    }

    pub fn distances(&self) -> &[Vec<f64>] {
        &self.distances
    }

    pub fn contains(&self, station: StationId) -> bool {
        station.0 < self.names.len()
    }
}

/// Derived per-pair trip energy cost (kWh) and trip time (hours).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripTables {
    pub cost: Vec<Vec<f64>>,
    pub time: Vec<Vec<f64>>,
}

impl TripTables {
    /// `cost = distance * energy_per_km`, `time = distance / speed`.
    pub fn derive(network: &StationNetwork, energy_per_km: f64, speed_kmh: f64) -> Self {
        let cost = network
            .distances()
            .iter()
            .map(|row| row.iter().map(|d| d * energy_per_km).collect())
            .collect();
        let time = network
            .distances()
            .iter()
            .map(|row| row.iter().map(|d| d / speed_kmh).collect())
            .collect();
        Self { cost, time }
    }

    pub fn cost(&self, from: StationId, to: StationId) -> f64 {
        self.cost[from.0][to.0]
    }

    pub fn time(&self, from: StationId, to: StationId) -> f64 {
        self.time[from.0][to.0]
    }
}

/// Which stations have a charger installed. Fixed for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargingPlan(pub Vec<bool>);

impl ChargingPlan {
    pub fn new(installed: Vec<bool>) -> Self {
        ChargingPlan(installed)
    }

    pub fn is_installed(&self, station: StationId) -> bool {
        self.0.get(station.0).copied().unwrap_or(false)
    }

    pub fn installed_count(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

/// A single bus and its timetabled route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusRoute {
    pub key: BusKey,
    /// Station visited at each stop
    pub stops: Vec<StationId>,
    /// Scheduled arrival per stop, hour-of-day decimal (midnight is 24.0)
    pub scheduled: Vec<f64>,
    /// Driver rest mandated after each stop
    pub rests: Vec<bool>,
}

impl BusRoute {
    pub fn new(key: BusKey, stops: Vec<StationId>, scheduled: Vec<f64>, rests: Vec<bool>) -> Self {
        Self {
            key,
            stops,
            scheduled,
            rests,
        }
    }

    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    /// Scheduled start of the route.
    pub fn start_time(&self) -> f64 {
        self.scheduled.first().copied().unwrap_or(f64::INFINITY)
    }

    /// Scheduled arrival at the final stop.
    pub fn end_time(&self) -> f64 {
        self.scheduled.last().copied().unwrap_or(f64::NEG_INFINITY)
    }

    fn validate(&self, network: &StationNetwork) -> SchedResult<()> {
        if self.stops.is_empty() {
            return Err(SchedError::data(format!("bus {} has no stops", self.key)));
        }
        if self.scheduled.len() != self.stops.len() || self.rests.len() != self.stops.len() {
            return Err(SchedError::data(format!(
                "bus {} has {} stops, {} scheduled times and {} rest flags",
                self.key,
                self.stops.len(),
                self.scheduled.len(),
                self.rests.len()
            )));
        }
        for (i, station) in self.stops.iter().enumerate() {
            if !network.contains(*station) {
                return Err(SchedError::data(format!(
                    "bus {} stop {} references station {} but only {} stations exist",
                    self.key,
                    i,
                    station.0,
                    network.num_stations()
                )));
            }
        }
        for (i, &t) in self.scheduled.iter().enumerate() {
            if !t.is_finite() || !(0.0..=24.0).contains(&t) {
                return Err(SchedError::data(format!(
                    "bus {} stop {} has scheduled time {} outside [0, 24]",
                    self.key, i, t
                )));
            }
        }
        Ok(())
    }
}

/// Validated, immutable input for one scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleInput {
    network: StationNetwork,
    plan: ChargingPlan,
    routes: Vec<BusRoute>,
    windows: Vec<CleanEnergyWindow>,
}

impl ScheduleInput {
    /// Validate the records and normalize them for formulation.
    ///
    /// Routes are ordered by bus key. Windows ending at or before the
    /// earliest route start are discarded: no bus can use them.
    pub fn new(
        network: StationNetwork,
        plan: ChargingPlan,
        mut routes: Vec<BusRoute>,
        windows: Vec<CleanEnergyWindow>,
    ) -> SchedResult<Self> {
        if plan.0.len() != network.num_stations() {
            return Err(SchedError::data(format!(
                "charging plan has {} entries for {} stations",
                plan.0.len(),
                network.num_stations()
            )));
        }
        if routes.is_empty() {
            return Err(SchedError::data("no bus routes provided"));
        }
        for route in &routes {
            route.validate(&network)?;
        }

        routes.sort_by_key(|r| r.key);
        if let Some(pair) = routes.windows(2).find(|pair| pair[0].key == pair[1].key) {
            return Err(SchedError::data(format!(
                "bus {} appears more than once",
                pair[0].key
            )));
        }

        let first_departure = routes
            .iter()
            .map(BusRoute::start_time)
            .fold(f64::INFINITY, f64::min);
        let before = windows.len();
        let windows: Vec<CleanEnergyWindow> = windows
            .into_iter()
            .filter(|w| w.end_time > first_departure)
            .collect();
        if windows.len() < before {
            debug!(
                dropped = before - windows.len(),
                first_departure, "discarded clean energy windows ending before the first bus"
            );
        }

        Ok(Self {
            network,
            plan,
            routes,
            windows,
        })
    }

    pub fn network(&self) -> &StationNetwork {
        &self.network
    }

    pub fn plan(&self) -> &ChargingPlan {
        &self.plan
    }

    /// Routes ordered by bus key.
    pub fn routes(&self) -> &[BusRoute] {
        &self.routes
    }

    pub fn route(&self, key: BusKey) -> Option<&BusRoute> {
        self.routes
            .binary_search_by_key(&key, |r| r.key)
            .ok()
            .map(|idx| &self.routes[idx])
    }

    /// Windows usable by at least one bus, in specification order.
    pub fn windows(&self) -> &[CleanEnergyWindow] {
        &self.windows
    }

    pub fn num_buses(&self) -> usize {
        self.routes.len()
    }

    pub fn num_stops(&self) -> usize {
        self.routes.iter().map(BusRoute::num_stops).sum()
    }
}
