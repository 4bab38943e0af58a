//! Rolling-horizon recalculation.
//!
//! A prior [`ScheduleResult`] seeds a re-solve in two ways: decisions at
//! stops the buses have already passed are pinned
//! ([`pin_prior_decisions`]), and the full prior assignment can be offered
//! to the solver as a starting point ([`warm_start_values`]).

use ebus_core::{ScheduleResult, SchedError};

use super::formulation::Formulation;
use super::mip::VarId;
use super::variables::VariablePool;
use crate::SchedResult;

/// Pin every prior stop whose arrival is at or before `checkpoint`.
///
/// Arrival, deviation, capacity, charge flag, charge time and charge amount
/// are fixed with equalities. Non-renewable energy only gets a lower bound
/// so the model stays feasible if window data changed between runs.
///
/// Returns the number of pinned stops.
pub fn pin_prior_decisions(
    formulation: &mut Formulation,
    prior: &ScheduleResult,
    checkpoint: f64,
) -> SchedResult<usize> {
    prior.validate()?;
    let mut pinned = 0;

    for bus in &prior.buses {
        let bus_vars = formulation.vars.bus(bus.key).ok_or_else(|| {
            SchedError::data(format!(
                "prior result has bus {} which is not part of the current input",
                bus.key
            ))
        })?;
        if bus_vars.stops.len() != bus.num_stops() {
            return Err(SchedError::data(format!(
                "bus {} has {} stops but the prior result has {}",
                bus.key,
                bus_vars.stops.len(),
                bus.num_stops()
            )));
        }

        for (i, s) in bus_vars.stops.iter().enumerate() {
            if bus.arrival[i] > checkpoint {
                continue;
            }
            let tag = format!("b{}_s{}_prior", bus.key, i);
            let model = &mut formulation.model;
            model.eq(format!("{}_arrival", tag), s.arrival, bus.arrival[i]);
            model.eq(format!("{}_deviation", tag), s.deviation, bus.deviation[i]);
            model.eq(format!("{}_capacity", tag), s.capacity, bus.capacity[i]);
            model.eq(
                format!("{}_charge", tag),
                s.charge,
                if bus.charge[i] { 1.0 } else { 0.0 },
            );
            model.eq(format!("{}_charge_time", tag), s.charge_time, bus.charge_time[i]);
            model.eq(
                format!("{}_charge_amount", tag),
                s.charge_amount,
                bus.charge_amount[i],
            );
            model.ge(
                format!("{}_non_renewable", tag),
                s.non_renewable,
                bus.non_renewable[i],
            );
            pinned += 1;
        }
    }

    formulation.stats.pinned_stops += pinned;
    formulation.refresh_stats();
    Ok(pinned)
}

/// Initial values for the variables of `vars`, taken from `prior`.
///
/// Values are matched by bus key, stop index and window index. Variables
/// with no counterpart in the prior result are left out.
pub fn warm_start_values(vars: &VariablePool, prior: &ScheduleResult) -> Vec<(VarId, f64)> {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    let mut values = Vec::new();

    for (bus_index, bus) in prior.buses.iter().enumerate() {
        let Some(bus_vars) = vars.bus(bus.key) else {
            continue;
        };
        if !bus.is_consistent() {
            continue;
        }
        for (i, s) in bus_vars.stops.iter().enumerate().take(bus.num_stops()) {
            values.extend([
                (s.arrival, bus.arrival[i]),
                (s.deviation, bus.deviation[i]),
                (s.capacity, bus.capacity[i]),
                (s.charge_time, bus.charge_time[i]),
                (s.charge_amount, bus.charge_amount[i]),
                (s.non_renewable, bus.non_renewable[i]),
                (s.charge, flag(bus.charge[i])),
            ]);
            if let (Some(var), Some(ase)) = (s.ase, bus.ase.as_ref()) {
                values.push((var, flag(ase[i])));
            }
            if let (Some(var), Some(discount)) = (s.discount, bus.discount.as_ref()) {
                values.push((var, discount[i]));
            }

            for (k, w) in s.reachable_windows() {
                if let Some(&time) = bus.clean_charge_time.get(i).and_then(|t| t.get(k)) {
                    values.push((w.charge_time, time));
                }
                if let Some(&used) = bus.clean_window_charge.get(i).and_then(|t| t.get(k)) {
                    values.push((w.charge, flag(used)));
                }
                let energy = prior
                    .window_energy_used
                    .get(k)
                    .and_then(|per_bus| per_bus.get(bus_index))
                    .and_then(|per_stop| per_stop.get(i));
                if let Some(&energy) = energy {
                    values.push((w.energy, energy));
                }
            }
        }
    }

    values
}
