pub mod cli;
pub mod report;
pub mod settings;

pub use cli::{Cli, Commands, InputArgs, SettingsArgs, SolveArgs};
