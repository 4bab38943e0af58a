//! Charging schedule solves with the bundled microlp backend

use std::collections::HashMap;

use ebus_algo::schedule::{warm_start_values, ChargingScheduler, GoodLpBackend, SolveStatus};
use ebus_core::{
    BusKey, BusRoute, ChargingPlan, CleanEnergyWindow, SchedError, ScheduleInput,
    ScheduleResult, SchedulerConfig, StationId, StationNetwork,
};

const TOL: f64 = 1e-5;

fn config_with(overrides: &[(&str, &str)]) -> SchedulerConfig {
    let mut map: HashMap<String, String> = [
        ("deviationTime", "0.25"),
        ("maxChargeTime", "0.5"),
        ("minChargeTime", "0.1"),
        ("chargeRate", "100"),
        ("maxBatteryCapacity", "300"),
        ("minBatteryCapacity", "20"),
        ("startingCapacity", "30"),
        ("busEnergyCost", "1.5"),
        ("busSpeed", "30"),
        ("bigM", "100"),
        ("horizonStartTime", "6"),
        ("horizonEndTime", "12"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        map.insert(k.to_string(), v.to_string());
    }
    SchedulerConfig::from_map(&map).unwrap()
}

fn route(key: i64, stops: &[usize], times: &[f64]) -> BusRoute {
    BusRoute::new(
        BusKey::new(key),
        stops.iter().copied().map(StationId::new).collect(),
        times.to_vec(),
        vec![false; stops.len()],
    )
}

/// Station A has a charger, station B does not; 10 km (15 kWh, 20 min) apart.
fn input(routes: Vec<BusRoute>, windows: Vec<CleanEnergyWindow>) -> ScheduleInput {
    let network = StationNetwork::new(
        vec!["A".into(), "B".into()],
        vec![vec![0.0, 10.0], vec![10.0, 0.0]],
    )
    .unwrap();
    ScheduleInput::new(network, ChargingPlan::new(vec![true, false]), routes, windows).unwrap()
}

/// Two buses leaving A at 8.0 and 8.2, sharing a 3 kWh window.
fn shared_window_input() -> ScheduleInput {
    input(
        vec![route(1, &[0, 1], &[8.0, 9.0]), route(2, &[0, 1], &[8.2, 9.2])],
        vec![CleanEnergyWindow::new(7.5, 8.6, 3.0)],
    )
}

/// Strip solver round-off so a result can be pinned exactly.
fn settle(mut result: ScheduleResult) -> ScheduleResult {
    let round = |v: &mut f64| *v = (*v * 1e6).round() / 1e6;
    for bus in &mut result.buses {
        for values in [
            &mut bus.arrival,
            &mut bus.deviation,
            &mut bus.capacity,
            &mut bus.charge_time,
            &mut bus.charge_amount,
            &mut bus.non_renewable,
        ] {
            values.iter_mut().for_each(round);
        }
    }
    result
}

fn assert_route_invariants(result: &ScheduleResult, config: &SchedulerConfig) {
    for bus in &result.buses {
        assert!(bus.deviation[0].abs() < TOL, "bus {} starts late", bus.key);
        assert!((bus.arrival[0] - bus.scheduled_arrival[0]).abs() < TOL);
        for i in 0..bus.num_stops() {
            assert!(bus.capacity[i] + bus.charge_amount[i] <= config.max_battery_capacity + TOL);
            if i > 0 {
                assert!(bus.capacity[i] >= config.min_battery_capacity - TOL);
            }
            if !result.charging_stations[bus.stops[i].value()] {
                assert!((bus.non_renewable[i] - bus.charge_amount[i]).abs() < TOL);
                for k in 0..result.windows.len() {
                    let b = result.buses.iter().position(|x| x.key == bus.key).unwrap();
                    assert!(result.window_energy_used[k][b][i].abs() < TOL);
                }
            }
        }
    }
    for (k, window) in result.windows.iter().enumerate() {
        let used = result.window_usage(k).unwrap().total;
        assert!(used <= window.available_energy + TOL);
    }
}

#[test]
fn test_single_bus_charges_only_where_installed() {
    let config = config_with(&[]);
    let input = input(vec![route(1, &[0, 1], &[8.0, 9.0])], vec![]);

    let outcome = ChargingScheduler::new(&input, &config)
        .solve(&GoodLpBackend::default())
        .expect("single bus schedule should be feasible");

    assert_eq!(outcome.status, SolveStatus::Optimal);
    // 15 kWh trip + 20 kWh reserve - 30 kWh on board
    assert!((outcome.objective_value - 5.0).abs() < TOL);

    let bus = &outcome.result.buses[0];
    assert!(bus.charge[0] && !bus.charge[1]);
    assert!((bus.charge_amount[0] - 5.0).abs() < TOL);
    assert!((bus.non_renewable[0] - bus.charge_amount[0]).abs() < TOL);
    assert!(bus.charge_amount[1].abs() < TOL);
    assert!(bus.non_renewable[1].abs() < TOL);
    assert!(bus.charge_time[0] >= config.min_charge_time - TOL);

    assert_route_invariants(&outcome.result, &config);
}

#[test]
fn test_shared_window_budget_and_charger_exclusivity() {
    let config = config_with(&[]);
    let input = shared_window_input();

    let outcome = ChargingScheduler::new(&input, &config)
        .solve(&GoodLpBackend::default())
        .unwrap();

    // each bus needs 5 kWh; 3 kWh of it can be clean
    assert!((outcome.objective_value - 7.0).abs() < TOL);
    let usage = outcome.result.window_usage(0).unwrap();
    assert!((usage.total - 3.0).abs() < TOL);

    // bus 1 has to finish charging before bus 2 arrives at 8.2
    let (a, b) = (&outcome.result.buses[0], &outcome.result.buses[1]);
    assert!(a.charge[0] && b.charge[0]);
    assert!(a.arrival[0] + a.charge_time[0] <= b.arrival[0] + TOL);

    let conflict = outcome
        .result
        .station_conflicts
        .iter()
        .find(|c| c.stop_a == 0 && c.stop_b == 0)
        .unwrap();
    assert!(conflict.same_stop);
    assert!(!(conflict.release_a_after_b && conflict.release_b_after_a));

    assert_route_invariants(&outcome.result, &config);
}

#[test]
fn test_spm_forces_ase_before_horizon_end() {
    let config = config_with(&[
        ("method", "SPM"),
        ("discountFactor", "0.5"),
        ("horizonEndTime", "9.5"),
    ]);
    let input = input(vec![route(1, &[0, 1, 0], &[8.0, 9.0, 10.0])], vec![]);

    let outcome = ChargingScheduler::new(&input, &config)
        .solve(&GoodLpBackend::default())
        .unwrap();

    let bus = &outcome.result.buses[0];
    let ase = bus.ase.as_ref().unwrap();
    let discount = bus.discount.as_ref().unwrap();
    assert!(ase[0], "stop before the horizon end must set ase");
    assert!(discount[0].abs() < TOL);
    // 20 kWh are needed at stop 0 to reach B with 20 kWh left and return
    assert!((bus.charge_amount[0] - 20.0).abs() < TOL);
    assert!((outcome.objective_value - 20.0).abs() < TOL);
}

#[test]
fn test_recalculation_keeps_executed_decisions() {
    let input = shared_window_input();
    let first = ChargingScheduler::new(&input, &config_with(&[]))
        .solve(&GoodLpBackend::default())
        .unwrap();
    let prior = settle(first.result);

    let config = config_with(&[("recalculate", "true"), ("horizonStartTime", "8.3")]);
    let scheduler = ChargingScheduler::new(&input, &config).with_prior(&prior);
    let formulation = scheduler.formulate().unwrap();
    assert_eq!(formulation.stats.pinned_stops, 2);

    let second = scheduler.solve(&GoodLpBackend::default()).unwrap();
    for (old, new) in prior.buses.iter().zip(&second.result.buses) {
        for i in 0..old.num_stops() {
            if old.arrival[i] > 8.3 {
                continue;
            }
            assert!((old.arrival[i] - new.arrival[i]).abs() < TOL);
            assert!((old.capacity[i] - new.capacity[i]).abs() < TOL);
            assert!((old.charge_time[i] - new.charge_time[i]).abs() < TOL);
            assert!((old.charge_amount[i] - new.charge_amount[i]).abs() < TOL);
            assert_eq!(old.charge[i], new.charge[i]);
            assert!(new.non_renewable[i] >= old.non_renewable[i] - TOL);
        }
    }
}

#[test]
fn test_recalculation_requires_prior() {
    let input = shared_window_input();
    let config = config_with(&[("recalculate", "true")]);
    let err = ChargingScheduler::new(&input, &config)
        .formulate()
        .unwrap_err();
    assert!(matches!(err, SchedError::Config(_)));
}

#[test]
fn test_prior_for_unknown_bus_is_rejected() {
    let input = shared_window_input();
    let first = ChargingScheduler::new(&input, &config_with(&[]))
        .solve(&GoodLpBackend::default())
        .unwrap();
    let mut prior = first.result;
    prior.buses[1].key = BusKey(99);

    let config = config_with(&[("recalculate", "true"), ("horizonStartTime", "8.3")]);
    let err = ChargingScheduler::new(&input, &config)
        .with_prior(&prior)
        .formulate()
        .unwrap_err();
    assert!(matches!(err, SchedError::DataConsistency(_)));
}

#[test]
fn test_warm_start_covers_prior_variables() {
    let input = shared_window_input();
    let config = config_with(&[]);
    let first = ChargingScheduler::new(&input, &config)
        .solve(&GoodLpBackend::default())
        .unwrap();

    let scheduler = ChargingScheduler::new(&input, &config).with_warm_start(&first.result);
    let formulation = scheduler.formulate().unwrap();
    let seed = warm_start_values(&formulation.vars, &first.result);

    // 7 per stop for 4 stops, plus 3 per reachable window slot (one per bus)
    assert_eq!(seed.len(), 4 * 7 + 2 * 3);
    let again = scheduler.solve(&GoodLpBackend::default()).unwrap();
    assert!((again.objective_value - first.objective_value).abs() < TOL);
}

#[test]
fn test_infeasible_schedule_is_reported() {
    // 15 kWh trip from 20 kWh on board with no charger anywhere
    let config = config_with(&[("startingCapacity", "20")]);
    let input = input(vec![route(1, &[1, 0], &[8.0, 9.0])], vec![]);
    let plan_less = ScheduleInput::new(
        input.network().clone(),
        ChargingPlan::new(vec![false, false]),
        input.routes().to_vec(),
        vec![],
    )
    .unwrap();

    let err = ChargingScheduler::new(&plan_less, &config)
        .solve(&GoodLpBackend::default())
        .unwrap_err();
    assert!(matches!(err, SchedError::Infeasible { .. }), "{err}");
}

#[test]
fn test_single_window_draw_is_limited_to_one_hour_of_charging() {
    // 150 kWh trip; 140 kWh must be charged at A within one 1.4 h stop
    let config = config_with(&[("maxChargeTime", "2"), ("busEnergyCost", "15")]);
    let input = input(
        vec![route(1, &[0, 1], &[8.0, 10.0])],
        vec![CleanEnergyWindow::new(7.5, 12.0, 1000.0)],
    );

    let outcome = ChargingScheduler::new(&input, &config)
        .solve(&GoodLpBackend::default())
        .unwrap();

    let bus = &outcome.result.buses[0];
    assert!((bus.charge_amount[0] - 140.0).abs() < TOL);
    assert!((outcome.result.window_energy_used[0][0][0] - 100.0).abs() < TOL);
    assert!((outcome.objective_value - 40.0).abs() < TOL);
    assert_route_invariants(&outcome.result, &config);
}

#[test]
fn test_overlapping_windows_cannot_both_claim_the_same_time() {
    // 0.1 h at 100 kW before both windows close gives 10 of the 15 kWh needed
    let config = config_with(&[("maxChargeTime", "1"), ("startingCapacity", "20")]);
    let input = input(
        vec![route(1, &[0, 1], &[8.0, 9.0])],
        vec![
            CleanEnergyWindow::new(7.5, 8.1, 100.0),
            CleanEnergyWindow::new(7.5, 8.1, 100.0),
        ],
    );

    let outcome = ChargingScheduler::new(&input, &config)
        .solve(&GoodLpBackend::default())
        .unwrap();

    let clean = outcome.result.window_usage(0).unwrap().total
        + outcome.result.window_usage(1).unwrap().total;
    assert!((clean - 10.0).abs() < TOL);
    assert!((outcome.objective_value - 5.0).abs() < TOL);
    assert_route_invariants(&outcome.result, &config);
}

#[test]
fn test_spm_discounts_charging_past_horizon_end() {
    // the only charger is reached at 9.75 or later, past the 9.5 horizon end
    let config = config_with(&[
        ("method", "SPM"),
        ("discountFactor", "0.5"),
        ("horizonEndTime", "9.5"),
        ("startingCapacity", "50"),
    ]);
    let input = input(vec![route(1, &[1, 0], &[9.0, 10.0])], vec![]);

    let outcome = ChargingScheduler::new(&input, &config)
        .solve(&GoodLpBackend::default())
        .unwrap();

    let bus = &outcome.result.buses[0];
    let ase = bus.ase.as_ref().unwrap();
    let discount = bus.discount.as_ref().unwrap();
    assert!(ase[0]);
    assert!(!ase[1], "stop past the horizon end may clear ase");
    // 15 kWh trip + 20 kWh reserve - 50 kWh on board
    assert!((bus.charge_amount[1] - 5.0).abs() < TOL);
    assert!((discount[1] - 2.5).abs() < TOL);
    assert!(discount[1] <= 0.5 * bus.charge_amount[1] + TOL);
    assert!((outcome.objective_value - 2.5).abs() < TOL);
}
