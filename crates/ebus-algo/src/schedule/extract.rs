//! Solution extraction.
//!
//! Maps a solver assignment back onto a [`ScheduleResult`]. The mapping is
//! pure: the same formulation and assignment always yield an identical
//! record. Binary variables are read as set when their value exceeds 0.5;
//! window slots without variables read as zero.

use ebus_core::{BusSchedule, ScheduleInput, ScheduleResult, StationConflictRecord};

use super::formulation::Formulation;
use super::mip::{Assignment, VarId};
use super::variables::StopVars;

fn flag<A: Assignment + ?Sized>(values: &A, var: VarId) -> bool {
    values.value(var) > 0.5
}

/// Build the result record for `values`, an assignment of every variable of
/// `formulation.model`.
pub fn extract_result<A: Assignment + ?Sized>(
    formulation: &Formulation,
    input: &ScheduleInput,
    values: &A,
) -> ScheduleResult {
    let num_windows = input.windows().len();
    let spm = formulation.method.is_spm();
    let mut window_energy_used = vec![Vec::with_capacity(input.num_buses()); num_windows];

    let buses = input
        .routes()
        .iter()
        .zip(formulation.vars.buses())
        .map(|(route, bus_vars)| {
            let stops = &bus_vars.stops;
            let read = |pick: fn(&StopVars) -> VarId| -> Vec<f64> {
                stops.iter().map(|s| values.value(pick(s))).collect()
            };

            let mut clean_charge_time = Vec::with_capacity(stops.len());
            let mut clean_window_charge = Vec::with_capacity(stops.len());
            let mut energy_by_window = vec![vec![0.0; stops.len()]; num_windows];
            for (i, s) in stops.iter().enumerate() {
                let mut times = vec![0.0; num_windows];
                let mut used = vec![false; num_windows];
                for (k, w) in s.reachable_windows() {
                    times[k] = values.value(w.charge_time);
                    used[k] = flag(values, w.charge);
                    energy_by_window[k][i] = values.value(w.energy);
                }
                clean_charge_time.push(times);
                clean_window_charge.push(used);
            }
            for (k, energy) in energy_by_window.into_iter().enumerate() {
                window_energy_used[k].push(energy);
            }

            BusSchedule {
                key: route.key,
                stops: route.stops.clone(),
                scheduled_arrival: route.scheduled.clone(),
                arrival: read(|s| s.arrival),
                deviation: read(|s| s.deviation),
                capacity: read(|s| s.capacity),
                charge_time: read(|s| s.charge_time),
                charge_amount: read(|s| s.charge_amount),
                charge: stops.iter().map(|s| flag(values, s.charge)).collect(),
                non_renewable: read(|s| s.non_renewable),
                ase: spm.then(|| {
                    stops
                        .iter()
                        .map(|s| s.ase.is_some_and(|v| flag(values, v)))
                        .collect()
                }),
                discount: spm.then(|| {
                    stops
                        .iter()
                        .map(|s| s.discount.map_or(0.0, |v| values.value(v)))
                        .collect()
                }),
                clean_charge_time,
                clean_window_charge,
            }
        })
        .collect();

    let station_conflicts = formulation
        .conflicts
        .iter()
        .map(|c| StationConflictRecord {
            station: c.station,
            bus_a: c.bus_a,
            stop_a: c.stop_a,
            bus_b: c.bus_b,
            stop_b: c.stop_b,
            same_stop: flag(values, c.same_stop),
            release_a_after_b: flag(values, c.release_a_after_b),
            release_b_after_a: flag(values, c.release_b_after_a),
        })
        .collect();

    ScheduleResult {
        method: formulation.method,
        stations: input.network().names().to_vec(),
        charging_stations: input.plan().as_slice().to_vec(),
        buses,
        trip_cost: formulation.trips.cost.clone(),
        trip_time: formulation.trips.time.clone(),
        windows: input.windows().to_vec(),
        window_energy_used,
        station_conflicts,
    }
}
