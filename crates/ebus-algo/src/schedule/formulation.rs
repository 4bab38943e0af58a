//! Constraint generation.
//!
//! Emits the feasibility, energy balance, timing and clean energy allocation
//! constraints for every bus and stop, the pairwise charger exclusivity
//! disjunctions, the per-bus energy sufficiency rows and the per-window
//! energy budgets.
//!
//! Constraint labels follow `b{key}_s{stop}_{what}` for per-stop rows,
//! `conflict_{pair}_{what}` for exclusivity rows, `bus{key}_{what}` for
//! per-bus rows and `window{k}_budget` for window budgets.

use ebus_core::{
    BusKey, BusRoute, FormulationMethod, ScheduleInput, SchedulerConfig, StationId, TripTables,
};
use tracing::{debug, info};

use super::mip::{LinExpr, MipModel, VarId};
use super::objective::non_renewable_objective;
use super::variables::{StopVars, VariablePool};
use crate::SchedResult;

/// Indicator variables guarding one pair of stops that share a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationConflict {
    pub station: StationId,
    pub bus_a: BusKey,
    pub stop_a: usize,
    pub bus_b: BusKey,
    pub stop_b: usize,
    /// 1 when both stops charge
    pub same_stop: VarId,
    /// 1 relaxes "a arrives after b finishes charging"
    pub release_a_after_b: VarId,
    /// 1 relaxes "b arrives after a finishes charging"
    pub release_b_after_a: VarId,
}

/// Size of a built formulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormulationStats {
    pub variables: usize,
    pub binaries: usize,
    pub constraints: usize,
    pub station_conflicts: usize,
    pub pruned_window_pairs: usize,
    /// Stops pinned to a prior result
    pub pinned_stops: usize,
}

/// A complete model together with the handles needed to read a solution back.
#[derive(Debug, Clone)]
pub struct Formulation {
    pub model: MipModel,
    pub vars: VariablePool,
    pub conflicts: Vec<StationConflict>,
    pub trips: TripTables,
    pub method: FormulationMethod,
    pub stats: FormulationStats,
}

impl Formulation {
    /// Allocate variables and emit every constraint and the objective.
    ///
    /// The configuration is validated first; nothing is emitted for an
    /// invalid configuration.
    pub fn build(input: &ScheduleInput, config: &SchedulerConfig) -> SchedResult<Self> {
        config.validate()?;

        let trips = TripTables::derive(input.network(), config.bus_energy_cost, config.bus_speed);
        let mut model = MipModel::new();
        let vars = VariablePool::allocate(&mut model, input, config);

        let conflicts = {
            let mut engine = ConstraintEngine {
                model: &mut model,
                input,
                config,
                trips: &trips,
                vars: &vars,
            };
            for (route, bus_vars) in input.routes().iter().zip(vars.buses()) {
                engine.route_constraints(route, &bus_vars.stops);
            }
            let conflicts = engine.station_conflicts();
            for (route, bus_vars) in input.routes().iter().zip(vars.buses()) {
                engine.energy_sufficiency(route, &bus_vars.stops);
            }
            engine.window_budgets();
            conflicts
        };

        model.set_objective(non_renewable_objective(&vars));

        let mut formulation = Self {
            model,
            vars,
            conflicts,
            trips,
            method: config.method,
            stats: FormulationStats::default(),
        };
        formulation.refresh_stats();

        info!(
            buses = input.num_buses(),
            stops = input.num_stops(),
            windows = input.windows().len(),
            variables = formulation.stats.variables,
            binaries = formulation.stats.binaries,
            constraints = formulation.stats.constraints,
            conflicts = formulation.stats.station_conflicts,
            "built charging schedule model"
        );

        Ok(formulation)
    }

    /// Recount model size after constraints were added.
    pub fn refresh_stats(&mut self) {
        self.stats.variables = self.model.num_vars();
        self.stats.binaries = self.model.num_binaries();
        self.stats.constraints = self.model.num_constraints();
        self.stats.station_conflicts = self.conflicts.len();
        self.stats.pruned_window_pairs = self.vars.pruned_window_pairs();
    }
}

struct ConstraintEngine<'a> {
    model: &'a mut MipModel,
    input: &'a ScheduleInput,
    config: &'a SchedulerConfig,
    trips: &'a TripTables,
    vars: &'a VariablePool,
}

impl ConstraintEngine<'_> {
    /// Per-stop rows for one bus, in stop order.
    fn route_constraints(&mut self, route: &BusRoute, stops: &[StopVars]) {
        for (i, s) in stops.iter().enumerate() {
            let tag = format!("b{}_s{}", route.key, i);
            let station = route.stops[i];

            if i == 0 {
                self.model.eq(
                    format!("{}_start_capacity", tag),
                    s.capacity,
                    self.config.starting_capacity,
                );
            } else {
                self.model.ge(
                    format!("{}_capacity_min", tag),
                    s.capacity,
                    self.config.min_battery_capacity,
                );
            }
            self.model.le(
                format!("{}_capacity_max", tag),
                s.capacity + s.charge_amount,
                self.config.max_battery_capacity,
            );
            self.charge_linkage(&tag, s, station);

            if i == 0 {
                self.model.le(format!("{}_start_deviation", tag), s.deviation, 0.0);
                self.model.eq(
                    format!("{}_start_arrival", tag),
                    s.arrival,
                    route.scheduled[0],
                );
            } else {
                self.transition(&tag, route, stops, i);
            }

            self.model.le(
                format!("{}_non_renewable_cap", tag),
                s.non_renewable,
                s.charge_amount,
            );

            if self.config.method.is_spm() {
                self.horizon_discount(&tag, s);
            }
            self.clean_energy(&tag, s, station);
        }
    }

    /// Charge flag, charge time and charge amount linkage; charging needs an installed station.
    fn charge_linkage(&mut self, tag: &str, s: &StopVars, station: StationId) {
        let installed = if self.input.plan().is_installed(station) {
            1.0
        } else {
            0.0
        };
        self.model.le(
            format!("{}_charge_time_max", tag),
            s.charge_time,
            self.config.max_charge_time * s.charge,
        );
        self.model.ge(
            format!("{}_charge_time_min", tag),
            s.charge_time,
            self.config.min_charge_time * s.charge,
        );
        self.model.le(format!("{}_installed", tag), s.charge, installed);
        self.model.le(
            format!("{}_charge_rate", tag),
            s.charge_amount,
            self.config.charge_rate * s.charge_time,
        );
    }

    /// Rows linking stop `i` to stop `i - 1` of the same bus.
    fn transition(&mut self, tag: &str, route: &BusRoute, stops: &[StopVars], i: usize) {
        let j = i - 1;
        let (prev, s) = (&stops[j], &stops[i]);
        let (from, to) = (route.stops[j], route.stops[i]);

        self.model.le(
            format!("{}_capacity_continuity", tag),
            s.capacity,
            prev.capacity + prev.charge_amount - self.trips.cost(from, to),
        );

        // A timetable gap shorter than the nominal trip is authoritative.
        let scheduled_gap = route.scheduled[i] - route.scheduled[j];
        let min_elapsed = scheduled_gap.min(self.trips.time(from, to));
        self.model.ge(
            format!("{}_travel_time", tag),
            s.arrival,
            prev.arrival + prev.charge_time + min_elapsed,
        );

        if route.rests[j] && from == to {
            self.model.le(format!("{}_rest", tag), s.deviation, 0.0);
        }

        let scheduled = route.scheduled[i];
        self.model.ge(
            format!("{}_deviation_late", tag),
            s.deviation,
            s.arrival - scheduled,
        );
        self.model.ge(
            format!("{}_deviation_early", tag),
            s.deviation,
            LinExpr::constant(scheduled) - s.arrival,
        );
    }

    /// SPM: `ase` is forced to 1 before the horizon end; discounts only past it.
    fn horizon_discount(&mut self, tag: &str, s: &StopVars) {
        let (Some(ase), Some(discount)) = (s.ase, s.discount) else {
            return;
        };
        let big_m = self.config.big_m;
        self.model.ge(
            format!("{}_after_horizon", tag),
            s.arrival + big_m * ase,
            self.config.horizon_end_time,
        );
        self.model.le(
            format!("{}_discount_share", tag),
            discount,
            self.config.discount_factor * s.charge_amount,
        );
        self.model.le(
            format!("{}_discount_gate", tag),
            discount,
            LinExpr::constant(big_m) - big_m * ase,
        );
    }

    /// Clean energy window allocation at one stop.
    fn clean_energy(&mut self, tag: &str, s: &StopVars, station: StationId) {
        let windows = self.input.windows();
        let discount = s.discount.map(LinExpr::from).unwrap_or_default();

        if !self.input.plan().is_installed(station) || windows.is_empty() {
            self.model.ge(
                format!("{}_non_renewable_floor", tag),
                s.non_renewable,
                s.charge_amount - discount,
            );
            for (k, w) in s.reachable_windows() {
                self.model.le(
                    format!("{}_w{}_unused", tag, k),
                    w.energy + w.charge_time + w.charge,
                    0.0,
                );
            }
            return;
        }

        let big_m = self.config.big_m;
        let max_time = self.config.max_charge_time;
        let mut claimed = LinExpr::new();
        let mut window_time = LinExpr::new();
        let mut window_energy = LinExpr::new();

        for (k, w) in s.reachable_windows() {
            let window = windows[k];
            // M(1 - flag)
            let relax = LinExpr::constant(big_m) - big_m * w.charge;
            let wtag = format!("{}_w{}", tag, k);

            self.model.ge(
                format!("{}_opens", wtag),
                s.arrival + s.charge_time + relax.clone(),
                window.start_time,
            );
            self.model.le(
                format!("{}_closes", wtag),
                s.arrival - relax.clone(),
                window.end_time,
            );
            self.model.le(format!("{}_time_gate", wtag), w.charge_time, w.charge);
            self.model.le(
                format!("{}_energy_gate", wtag),
                w.energy,
                self.config.charge_rate * w.charge,
            );
            self.model.le(format!("{}_time_cap", wtag), w.charge_time, max_time * w.charge);
            self.model.ge(format!("{}_implies_charge", wtag), s.charge, w.charge);
            self.model.ge(
                format!("{}_sequential", wtag),
                LinExpr::constant(window.end_time) - s.arrival - claimed.clone() + relax.clone(),
                w.charge_time,
            );
            self.model.ge(
                format!("{}_presence", wtag),
                s.arrival + s.charge_time - window.start_time + relax,
                w.charge_time,
            );
            self.model.le(
                format!("{}_energy_rate", wtag),
                w.energy,
                self.config.charge_rate * w.charge_time,
            );

            claimed += w.charge_time;
            window_time += w.charge_time;
            window_energy += w.energy;
        }

        if !window_time.is_empty() {
            self.model.le(
                format!("{}_window_time_total", tag),
                window_time,
                s.charge_time,
            );
            self.model.le(
                format!("{}_window_energy_total", tag),
                window_energy.clone(),
                s.charge_amount,
            );
        }
        self.model.ge(
            format!("{}_non_renewable_floor", tag),
            s.non_renewable,
            s.charge_amount - window_energy - discount,
        );
    }

    /// Pairwise exclusivity for stops of different buses at the same station.
    fn station_conflicts(&mut self) -> Vec<StationConflict> {
        let routes = self.input.routes();
        let buses = self.vars.buses();
        let span = self.config.conflict_span();
        let big_m = self.config.big_m;
        let mut conflicts = Vec::new();

        for a in 0..routes.len() {
            for b in (a + 1)..routes.len() {
                let (ra, rb) = (&routes[a], &routes[b]);
                for i in 0..ra.num_stops() {
                    for j in 0..rb.num_stops() {
                        if ra.stops[i] != rb.stops[j]
                            || (ra.scheduled[i] - rb.scheduled[j]).abs() > span
                        {
                            continue;
                        }
                        let (sa, sb) = (&buses[a].stops[i], &buses[b].stops[j]);
                        let pair = format!("b{}_s{}_b{}_s{}", ra.key, i, rb.key, j);

                        let same_stop = self.model.binary(format!("same_stop_{}", pair));
                        let release_a_after_b =
                            self.model.binary(format!("release_a_after_b_{}", pair));
                        let release_b_after_a =
                            self.model.binary(format!("release_b_after_a_{}", pair));

                        self.model
                            .le(format!("conflict_{}_same_a", pair), same_stop, sa.charge);
                        self.model
                            .le(format!("conflict_{}_same_b", pair), same_stop, sb.charge);
                        self.model.le(
                            format!("conflict_{}_both_charge", pair),
                            sa.charge + sb.charge,
                            same_stop + 1.0,
                        );
                        self.model.ge(
                            format!("conflict_{}_a_after_b", pair),
                            LinExpr::from(sa.arrival),
                            sb.arrival + sb.charge_time - big_m * release_a_after_b,
                        );
                        self.model.ge(
                            format!("conflict_{}_b_after_a", pair),
                            LinExpr::from(sb.arrival),
                            sa.arrival + sa.charge_time - big_m * release_b_after_a,
                        );
                        self.model.le(
                            format!("conflict_{}_ordering", pair),
                            release_a_after_b + release_b_after_a + same_stop,
                            2.0,
                        );

                        conflicts.push(StationConflict {
                            station: ra.stops[i],
                            bus_a: ra.key,
                            stop_a: i,
                            bus_b: rb.key,
                            stop_b: j,
                            same_stop,
                            release_a_after_b,
                            release_b_after_a,
                        });
                    }
                }
            }
        }
        conflicts
    }

    /// Each bus gains at least the energy its route consumes below the start level.
    fn energy_sufficiency(&mut self, route: &BusRoute, stops: &[StopVars]) {
        let travel: f64 = route
            .stops
            .windows(2)
            .map(|leg| self.trips.cost(leg[0], leg[1]))
            .sum();
        let need =
            travel + self.config.min_battery_capacity - self.config.starting_capacity;
        debug!(
            bus = route.key.value(),
            travel_energy = travel,
            min_energy_needed = need,
            "bus energy requirement"
        );

        let gained: LinExpr = stops.iter().map(|s| s.charge_amount).sum();
        self.model
            .ge(format!("bus{}_energy_need", route.key), gained.clone(), need);
        if need <= 0.0 {
            self.model
                .le(format!("bus{}_no_charge_needed", route.key), gained, 0.0);
        }
    }

    /// Energy drawn from each window across all buses stays within its budget.
    fn window_budgets(&mut self) {
        for (k, window) in self.input.windows().iter().enumerate() {
            let drawn: LinExpr = self
                .vars
                .stops()
                .filter_map(|(_, _, s)| s.windows[k].map(|w| w.energy))
                .sum();
            if drawn.is_empty() {
                continue;
            }
            self.model
                .le(format!("window{}_budget", k), drawn, window.available_energy);
        }
    }
}
