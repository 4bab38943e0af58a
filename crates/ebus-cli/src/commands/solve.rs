//! `ebus solve`

use anyhow::{Context, Result};
use ebus_algo::schedule::{ChargingScheduler, GoodLpBackend, MipSolverKind};
use ebus_cli::cli::SolveArgs;
use ebus_cli::report::{write_report, SolveSummary};
use ebus_io::{read_solution, write_solution};
use std::io::{self, Write};
use tracing::warn;

use super::load_run;

pub fn handle(args: &SolveArgs) -> Result<()> {
    let (input, config) = load_run(&args.inputs, &args.settings)?;
    let kind: MipSolverKind = args.solver.parse()?;

    let prior = args
        .prior
        .as_deref()
        .map(read_solution)
        .transpose()
        .context("reading prior schedule")?;
    let seed = args
        .warm_start
        .as_deref()
        .map(read_solution)
        .transpose()
        .context("reading warm start schedule")?;

    if prior.is_some() && !config.recalculate {
        warn!("--prior given but recalculate is not set; prior schedule ignored");
    }

    let mut scheduler = ChargingScheduler::new(&input, &config);
    if let Some(prior) = &prior {
        scheduler = scheduler.with_prior(prior);
    }
    if let Some(seed) = &seed {
        scheduler = scheduler.with_warm_start(seed);
    }

    let outcome = scheduler
        .solve(&GoodLpBackend::new(kind))
        .context("solving charging schedule")?;

    if let Some(out) = &args.out {
        write_solution(out, &outcome.result)
            .with_context(|| format!("writing schedule to {}", out.display()))?;
    }

    let summary = SolveSummary {
        objective_value: outcome.objective_value,
        status: outcome.status,
        relative_gap: outcome.relative_gap,
        elapsed: outcome.solve_time,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(
        &mut out,
        &outcome.result,
        config.horizon_start_time,
        config.horizon_end_time,
        Some(&summary),
    )?;
    if let Some(path) = &args.out {
        writeln!(out, "\nSchedule written to {}", path.display())?;
    }
    Ok(())
}
