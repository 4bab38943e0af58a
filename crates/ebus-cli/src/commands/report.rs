//! `ebus report`

use anyhow::{Context, Result};
use ebus_cli::report::write_report;
use ebus_io::read_solution;
use std::io;
use std::path::Path;

pub fn handle(solution: &Path, horizon_start: f64, horizon_end: f64) -> Result<()> {
    let result = read_solution(solution)
        .with_context(|| format!("reading schedule from {}", solution.display()))?;
    write_report(&mut io::stdout().lock(), &result, horizon_start, horizon_end, None)?;
    Ok(())
}
