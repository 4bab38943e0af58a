//! `ebus validate`

use anyhow::{Context, Result};
use ebus_algo::schedule::Formulation;
use ebus_cli::cli::{InputArgs, SettingsArgs};

use super::load_run;

pub fn handle(inputs: &InputArgs, settings: &SettingsArgs) -> Result<()> {
    let (input, config) = load_run(inputs, settings)?;
    let formulation = Formulation::build(&input, &config).context("building model")?;
    let stats = &formulation.stats;

    println!("Inputs are valid");
    println!(
        "  Stations: {} ({} with chargers)",
        input.network().num_stations(),
        input.plan().installed_count()
    );
    println!("  Buses: {} ({} stops)", input.num_buses(), input.num_stops());
    println!("  Clean energy windows: {}", input.windows().len());
    println!("  Method: {}", config.method);
    println!("Model:");
    println!("  Variables: {} ({} binary)", stats.variables, stats.binaries);
    println!("  Constraints: {}", stats.constraints);
    println!("  Station conflicts: {}", stats.station_conflicts);
    println!("  Pruned window pairs: {}", stats.pruned_window_pairs);
    Ok(())
}
