pub mod report;
pub mod solve;
pub mod validate;

use anyhow::{Context, Result};
use ebus_cli::cli::{InputArgs, SettingsArgs};
use ebus_core::{ScheduleInput, SchedulerConfig};
use ebus_io::{load_schedule_input, InputPaths};

/// Parse the settings and load the input files they apply to.
pub fn load_run(
    inputs: &InputArgs,
    settings: &SettingsArgs,
) -> Result<(ScheduleInput, SchedulerConfig)> {
    let map = ebus_cli::settings::load_settings(settings.config.as_deref(), &settings.overrides)?;
    let config = SchedulerConfig::from_map(&map).context("invalid scheduler settings")?;

    let paths = InputPaths::new(
        &inputs.stations,
        &inputs.distances,
        &inputs.buses,
        &inputs.charging_stations,
    )
    .excluding(inputs.exclude_lines.iter().cloned());
    let input = load_schedule_input(&paths, config.windows.clone()).context("loading input files")?;
    Ok((input, config))
}
