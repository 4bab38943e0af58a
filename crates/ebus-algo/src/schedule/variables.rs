//! Decision variable allocation.
//!
//! Declares every bounded unknown of the formulation, indexed by
//! (bus, stop) and (bus, stop, window). Buses are visited in key order,
//! stops in route order and windows in specification order, so identical
//! inputs always produce identical variable indices and names.

use ebus_core::{BusKey, ScheduleInput, SchedulerConfig};

use super::mip::{MipModel, VarId};

/// Per-window unknowns for one stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowVars {
    /// Time spent charging from the window (hours)
    pub charge_time: VarId,
    /// Whether the stop draws from the window
    pub charge: VarId,
    /// Energy drawn from the window (kWh)
    pub energy: VarId,
}

/// Unknowns for one (bus, stop) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopVars {
    pub arrival: VarId,
    pub deviation: VarId,
    pub capacity: VarId,
    pub charge_time: VarId,
    pub charge_amount: VarId,
    pub non_renewable: VarId,
    pub charge: VarId,
    /// SPM only
    pub ase: Option<VarId>,
    /// SPM only
    pub discount: Option<VarId>,
    /// One slot per window; `None` where the window cannot be reached from this stop
    pub windows: Vec<Option<WindowVars>>,
}

impl StopVars {
    /// Window variables that exist at this stop, with their window index.
    pub fn reachable_windows(&self) -> impl Iterator<Item = (usize, &WindowVars)> {
        self.windows
            .iter()
            .enumerate()
            .filter_map(|(k, w)| w.as_ref().map(|w| (k, w)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusVars {
    pub key: BusKey,
    pub stops: Vec<StopVars>,
}

/// Every decision variable of one formulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePool {
    buses: Vec<BusVars>,
    num_windows: usize,
    pruned_window_pairs: usize,
}

impl VariablePool {
    /// Declare the variables for `input` on `model`.
    pub fn allocate(model: &mut MipModel, input: &ScheduleInput, config: &SchedulerConfig) -> Self {
        let windows = input.windows();
        let max_amount = config.max_charge_amount();
        let spm = config.method.is_spm();
        let mut pruned_window_pairs = 0;

        let buses = input
            .routes()
            .iter()
            .map(|route| {
                let b = route.key;
                let stops = route
                    .scheduled
                    .iter()
                    .enumerate()
                    .map(|(i, &scheduled)| {
                        let tag = format!("b{}_s{}", b, i);
                        let window_vars = windows
                            .iter()
                            .enumerate()
                            .map(|(k, window)| {
                                if !window.reachable_from(
                                    scheduled,
                                    config.deviation_time,
                                    config.max_charge_time,
                                ) {
                                    pruned_window_pairs += 1;
                                    return None;
                                }
                                Some(WindowVars {
                                    charge_time: model.continuous(
                                        format!("window_time_{}_w{}", tag, k),
                                        0.0,
                                        config.max_charge_time,
                                    ),
                                    charge: model.binary(format!("window_charge_{}_w{}", tag, k)),
                                    energy: model.continuous(
                                        format!("window_energy_{}_w{}", tag, k),
                                        0.0,
                                        max_amount,
                                    ),
                                })
                            })
                            .collect();

                        StopVars {
                            arrival: model.continuous(format!("arrival_{}", tag), 0.0, 24.0),
                            deviation: model.continuous(
                                format!("deviation_{}", tag),
                                0.0,
                                config.deviation_time,
                            ),
                            capacity: model.continuous(
                                format!("capacity_{}", tag),
                                config.min_battery_capacity,
                                config.max_battery_capacity,
                            ),
                            charge_time: model.continuous(
                                format!("charge_time_{}", tag),
                                0.0,
                                config.max_charge_time,
                            ),
                            charge_amount: model.continuous(
                                format!("charge_amount_{}", tag),
                                0.0,
                                max_amount,
                            ),
                            non_renewable: model.continuous(
                                format!("non_renewable_{}", tag),
                                0.0,
                                max_amount,
                            ),
                            charge: model.binary(format!("charge_{}", tag)),
                            ase: spm.then(|| model.binary(format!("ase_{}", tag))),
                            discount: spm
                                .then(|| model.continuous(format!("discount_{}", tag), 0.0, max_amount)),
                            windows: window_vars,
                        }
                    })
                    .collect();
                BusVars { key: b, stops }
            })
            .collect();

        Self {
            buses,
            num_windows: windows.len(),
            pruned_window_pairs,
        }
    }

    /// Buses in key order.
    pub fn buses(&self) -> &[BusVars] {
        &self.buses
    }

    pub fn bus(&self, key: BusKey) -> Option<&BusVars> {
        self.buses.iter().find(|b| b.key == key)
    }

    pub fn stop(&self, key: BusKey, stop: usize) -> Option<&StopVars> {
        self.bus(key).and_then(|b| b.stops.get(stop))
    }

    pub fn num_windows(&self) -> usize {
        self.num_windows
    }

    /// (stop, window) pairs that received no variables.
    pub fn pruned_window_pairs(&self) -> usize {
        self.pruned_window_pairs
    }

    /// Every stop's variables, in allocation order.
    pub fn stops(&self) -> impl Iterator<Item = (BusKey, usize, &StopVars)> {
        self.buses
            .iter()
            .flat_map(|b| b.stops.iter().enumerate().map(move |(i, s)| (b.key, i, s)))
    }
}
