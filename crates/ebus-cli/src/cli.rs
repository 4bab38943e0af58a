use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Electric bus charging schedules with clean energy windows", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a charging schedule and print the report
    Solve(SolveArgs),
    /// Load the inputs, build the model and print its size without solving
    Validate {
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Print the report of a saved schedule
    Report {
        /// Schedule written by `ebus solve --out`
        #[arg(long)]
        solution: PathBuf,
        /// Start of the reporting horizon (hours)
        #[arg(long, default_value_t = 0.0)]
        horizon_start: f64,
        /// End of the reporting horizon (hours)
        #[arg(long, default_value_t = 24.0)]
        horizon_end: f64,
    },
}

/// Input files of a run.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Station CSV (header row, first column is the station name)
    #[arg(long)]
    pub stations: PathBuf,
    /// Distance CSV (`from,to,distance` in km)
    #[arg(long)]
    pub distances: PathBuf,
    /// Bus route JSON
    #[arg(long)]
    pub buses: PathBuf,
    /// Charging station plan (one 0/1 flag per station)
    #[arg(long)]
    pub charging_stations: PathBuf,
    /// Route line to leave out (repeatable)
    #[arg(long = "exclude-line", value_name = "LINE")]
    pub exclude_lines: Vec<String>,
}

/// Scheduler configuration sources.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// TOML file of scheduler settings (`chargeRate = 150`, ...)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override a setting (repeatable), e.g. `--set CEW=7-9=120,`
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = crate::settings::parse_override)]
    pub overrides: Vec<(String, String)>,
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    #[command(flatten)]
    pub settings: SettingsArgs,
    /// Prior schedule whose executed stops are kept (requires `recalculate = true`)
    #[arg(long)]
    pub prior: Option<PathBuf>,
    /// Schedule offered to the solver as a starting point
    #[arg(long)]
    pub warm_start: Option<PathBuf>,
    /// Write the solved schedule to this file (JSON)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// MIP solver backend
    #[arg(long, default_value = "microlp")]
    pub solver: String,
}
