//! Human-readable schedule report.

use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

use ebus_algo::schedule::SolveStatus;
use ebus_core::{BusSchedule, ScheduleResult};
use ebus_io::format_clock;
use tabwriter::TabWriter;

/// Solver figures shown at the end of a report produced right after a solve.
#[derive(Debug, Clone, Copy)]
pub struct SolveSummary {
    pub objective_value: f64,
    pub status: SolveStatus,
    pub relative_gap: Option<f64>,
    pub elapsed: Duration,
}

/// Write the full report for `result`.
///
/// Horizon totals cover the stops whose actual arrival lies within
/// `[horizon_start, horizon_end]`.
pub fn write_report<W: Write>(
    out: &mut W,
    result: &ScheduleResult,
    horizon_start: f64,
    horizon_end: f64,
    summary: Option<&SolveSummary>,
) -> io::Result<()> {
    writeln!(
        out,
        "Horizon: {} - {}  (method: {})",
        format_clock(horizon_start),
        format_clock(horizon_end),
        result.method
    )?;

    writeln!(out, "\nCharging stations installed:")?;
    for name in result.installed_stations() {
        writeln!(out, "  {}", name)?;
    }

    for bus in &result.buses {
        writeln!(out, "\nBus {}:", bus.key)?;
        write_bus_table(out, result, bus)?;
        writeln!(
            out,
            "  energy gained: {:.2} kWh, non-clean: {:.2} kWh, charges: {}",
            bus.total_charge_amount(),
            bus.total_non_renewable(),
            bus.charge_count()
        )?;
    }

    if !result.windows.is_empty() {
        writeln!(out, "\nClean energy windows:")?;
    }
    for k in 0..result.windows.len() {
        let Some(usage) = result.window_usage(k) else {
            continue;
        };
        writeln!(
            out,
            "  CEW {} [{} - {}): used {:.2} of {:.2} kWh",
            k,
            format_clock(usage.window.start_time),
            format_clock(usage.window.end_time),
            usage.total,
            usage.window.available_energy
        )?;
        for (key, amount) in &usage.per_bus {
            writeln!(out, "    bus {} used {:.2} kWh", key, amount)?;
        }
    }

    let horizon = result.horizon_totals(horizon_start, horizon_end);
    let totals = result.totals();
    writeln!(out)?;
    writeln!(out, "Horizon energy used:          {:.2} kWh", horizon.energy)?;
    writeln!(out, "Horizon non-clean energy:     {:.2} kWh", horizon.non_clean)?;
    writeln!(out, "Horizon charges:              {}", horizon.charges)?;
    writeln!(out, "Total energy used:            {:.2} kWh", totals.energy)?;
    writeln!(out, "Total non-clean energy:       {:.2} kWh", totals.non_clean)?;
    writeln!(out, "Total charges:                {}", totals.charges)?;

    if let Some(summary) = summary {
        writeln!(out, "Objective:                    {:.4}", summary.objective_value)?;
        writeln!(out, "Status:                       {}", summary.status)?;
        match summary.relative_gap {
            Some(gap) => writeln!(out, "Gap:                          {:.2}%", gap * 100.0)?,
            None => writeln!(out, "Gap:                          unknown")?,
        }
        writeln!(out, "Elapsed:                      {} ms", summary.elapsed.as_millis())?;
    }
    Ok(())
}

fn write_bus_table<W: Write>(out: &mut W, result: &ScheduleResult, bus: &BusSchedule) -> io::Result<()> {
    let spm = bus.ase.is_some();
    let mut tw = TabWriter::new(Vec::new());

    write!(tw, "  STOP\tSTATION\tSCHEDULED\tARRIVAL\tCHARGE TIME\tCAPACITY\tAMOUNT\tNON-CLEAN\tCHARGE")?;
    if spm {
        write!(tw, "\tASE\tDISCOUNT")?;
    }
    writeln!(tw)?;

    for i in 0..bus.num_stops() {
        let station = bus.stops[i].value();
        let name: &dyn Display = match result.stations.get(station) {
            Some(name) => name,
            None => &station,
        };
        write!(
            tw,
            "  {}\t{}\t{}\t{}\t{:.3}\t{:.2}\t{:.2}\t{:.2}\t{}",
            i,
            name,
            format_clock(bus.scheduled_arrival[i]),
            format_clock(bus.arrival[i]),
            bus.charge_time[i],
            bus.capacity[i],
            bus.charge_amount[i],
            bus.non_renewable[i],
            if bus.charge[i] { "yes" } else { "no" }
        )?;
        if let (Some(ase), Some(discount)) = (&bus.ase, &bus.discount) {
            write!(tw, "\t{}\t{:.2}", u8::from(ase[i]), discount[i])?;
        }
        writeln!(tw)?;
    }

    let table = tw.into_inner().map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    out.write_all(&table)
}
