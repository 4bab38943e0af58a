//! Integration tests for the `ebus` binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const SETTINGS: &str = r#"
deviationTime = 0.25
maxChargeTime = 0.5
minChargeTime = 0.1
chargeRate = 100
maxBatteryCapacity = 300
minBatteryCapacity = 20
startingCapacity = 30
busEnergyCost = 1.5
busSpeed = 30
bigM = 100
horizonStartTime = 6
horizonEndTime = 12
"#;

/// Depot has a charger, Central does not; one bus runs Depot -> Central.
fn write_inputs(dir: &Path) -> Vec<String> {
    let files = [
        ("stations.csv", "name\nDepot\nCentral\n"),
        ("distances.csv", "from,to,distance\n0,1,10\n"),
        ("chargers.txt", "1 0\n"),
        (
            "buses.json",
            r#"[{"line": "12", "buses": [{"bus": 4, "path": [
                {"time": "08:00", "station_id": 0},
                {"time": "09:00", "station_id": 1}
            ]}]}]"#,
        ),
        ("settings.toml", SETTINGS),
    ];
    for (name, contents) in files {
        fs::write(dir.join(name), contents).unwrap();
    }
    let path = |name: &str| dir.join(name).to_str().unwrap().to_string();
    vec![
        "--stations".into(),
        path("stations.csv"),
        "--distances".into(),
        path("distances.csv"),
        "--buses".into(),
        path("buses.json"),
        "--charging-stations".into(),
        path("chargers.txt"),
        "--config".into(),
        path("settings.toml"),
    ]
}

fn solve_to_file(dir: &TempDir) -> PathBuf {
    let out = dir.path().join("schedule.json");
    cargo_bin_cmd!("ebus")
        .arg("solve")
        .args(write_inputs(dir.path()))
        .args(["--out", out.to_str().unwrap()])
        .assert()
        .success();
    out
}

#[test]
fn test_help() {
    cargo_bin_cmd!("ebus")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("report"));
}

#[test]
fn test_solve_prints_report_and_writes_schedule() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("schedule.json");

    cargo_bin_cmd!("ebus")
        .arg("solve")
        .args(write_inputs(dir.path()))
        .args(["--out", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Charging stations installed:\n  Depot"))
        .stdout(predicate::str::contains("Bus 4:"))
        .stdout(predicate::str::contains("Total non-clean energy:       5.00 kWh"))
        .stdout(predicate::str::contains("Status:                       optimal"));

    let schedule = ebus_io::read_solution(&out).unwrap();
    assert_eq!(schedule.buses.len(), 1);
    assert!(schedule.buses[0].charge[0]);
}

#[test]
fn test_report_reads_saved_schedule() {
    let dir = tempdir().unwrap();
    let out = solve_to_file(&dir);

    cargo_bin_cmd!("ebus")
        .args(["report", "--solution", out.to_str().unwrap()])
        .args(["--horizon-start", "8.5", "--horizon-end", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Horizon charges:              0"))
        .stdout(predicate::str::contains("Total charges:                1"))
        .stdout(predicate::str::contains("Status:").not());
}

#[test]
fn test_set_overrides_settings_file() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("ebus")
        .arg("solve")
        .args(write_inputs(dir.path()))
        .args(["--set", "chargeRate=-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chargeRate must be positive"));
}

#[test]
fn test_validate_prints_model_size() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("ebus")
        .arg("validate")
        .args(write_inputs(dir.path()))
        .args(["--set", "CEW=7.5-8.5=20,"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inputs are valid"))
        .stdout(predicate::str::contains("Clean energy windows: 1"))
        .stdout(predicate::str::contains("Variables: "));
}

#[test]
fn test_recalculate_without_prior_fails() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("ebus")
        .arg("solve")
        .args(write_inputs(dir.path()))
        .args(["--set", "recalculate=true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no prior result"));
}

#[test]
fn test_unknown_solver_is_rejected() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("ebus")
        .arg("solve")
        .args(write_inputs(dir.path()))
        .args(["--solver", "gurobi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown mip solver 'gurobi'"));
}
