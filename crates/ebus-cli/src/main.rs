use anyhow::{Context, Result};
use clap::Parser;
use ebus_cli::cli::{Cli, Commands};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    match &cli.command {
        Commands::Solve(args) => commands::solve::handle(args),
        Commands::Validate { inputs, settings } => commands::validate::handle(inputs, settings),
        Commands::Report {
            solution,
            horizon_start,
            horizon_end,
        } => commands::report::handle(solution, *horizon_start, *horizon_end),
    }
}
