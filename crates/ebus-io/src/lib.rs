//! # ebus-io: Scheduler input files and result persistence
//!
//! Loads the four input files of a charging schedule run and persists
//! solved schedules.
//!
//! | File             | Format | Reader                                   |
//! |------------------|--------|------------------------------------------|
//! | Stations         | CSV    | [`stations::read_stations`]              |
//! | Distances        | CSV    | [`distances::read_distances`]            |
//! | Charging plan    | text   | [`charging::read_charging_plan`]         |
//! | Bus routes       | JSON   | [`routes::read_routes`]                  |
//! | Schedule result  | JSON   | [`solution::read_solution`] / [`solution::write_solution`] |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ebus_io::{load_schedule_input, InputPaths};
//!
//! fn main() -> ebus_core::SchedResult<()> {
//!     let paths = InputPaths::new("stations.csv", "distances.csv", "buses.json", "chargers.txt");
//!     let input = load_schedule_input(&paths, Vec::new())?;
//!     println!("{} buses, {} stops", input.num_buses(), input.num_stops());
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use ebus_core::{CleanEnergyWindow, SchedError, SchedResult, ScheduleInput, StationNetwork};
use tracing::info;

pub mod charging;
pub mod distances;
pub mod routes;
pub mod solution;
pub mod stations;
pub mod time;

pub use charging::{parse_charging_plan, read_charging_plan};
pub use distances::{parse_distances, read_distances};
pub use routes::{parse_routes, read_routes};
pub use solution::{read_solution, write_solution};
pub use stations::{parse_stations, read_stations};
pub use time::{format_clock, parse_clock};

/// Locations of the input files for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub stations: PathBuf,
    pub distances: PathBuf,
    pub buses: PathBuf,
    pub charging_stations: PathBuf,
    /// Route lines to leave out of the schedule
    pub excluded_lines: Vec<String>,
}

impl InputPaths {
    pub fn new(
        stations: impl Into<PathBuf>,
        distances: impl Into<PathBuf>,
        buses: impl Into<PathBuf>,
        charging_stations: impl Into<PathBuf>,
    ) -> Self {
        Self {
            stations: stations.into(),
            distances: distances.into(),
            buses: buses.into(),
            charging_stations: charging_stations.into(),
            excluded_lines: Vec::new(),
        }
    }

    pub fn excluding(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.excluded_lines.extend(lines);
        self
    }
}

/// Load and validate every input file into a [`ScheduleInput`].
pub fn load_schedule_input(
    paths: &InputPaths,
    windows: Vec<CleanEnergyWindow>,
) -> SchedResult<ScheduleInput> {
    let names = read_stations(&paths.stations)?;
    let distances = read_distances(&paths.distances, names.len())?;
    let network = StationNetwork::new(names, distances).map_err(|e| in_file(&paths.distances, e))?;
    let plan = read_charging_plan(&paths.charging_stations)?;
    let routes = read_routes(&paths.buses, &paths.excluded_lines)?;

    let input = ScheduleInput::new(network, plan, routes, windows)?;
    info!(
        stations = input.network().num_stations(),
        chargers = input.plan().installed_count(),
        buses = input.num_buses(),
        stops = input.num_stops(),
        windows = input.windows().len(),
        "loaded schedule input"
    );
    Ok(input)
}

fn open(path: &Path) -> SchedResult<File> {
    File::open(path).map_err(|e| {
        SchedError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

fn csv_error(err: csv::Error) -> SchedError {
    SchedError::Parse(err.to_string())
}

/// Prefix parse and data errors with the file they came from.
fn in_file(path: &Path, err: SchedError) -> SchedError {
    match err {
        SchedError::Parse(msg) => SchedError::Parse(format!("{}: {}", path.display(), msg)),
        SchedError::DataConsistency(msg) => {
            SchedError::DataConsistency(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}
