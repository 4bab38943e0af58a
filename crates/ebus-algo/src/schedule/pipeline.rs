//! End-to-end scheduling run.

use std::time::{Duration, Instant};

use ebus_core::{ScheduleInput, ScheduleResult, SchedError, SchedulerConfig};
use tracing::info;

use super::extract::extract_result;
use super::formulation::Formulation;
use super::rolling::{pin_prior_decisions, warm_start_values};
use super::solver::{MipBackend, SolveOptions, SolveStatus};
use crate::SchedResult;

/// A solved schedule together with the solver's report.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub result: ScheduleResult,
    pub objective_value: f64,
    pub status: SolveStatus,
    pub relative_gap: Option<f64>,
    /// Wall-clock time spent in the solver
    pub solve_time: Duration,
}

/// Formulates, solves and extracts one charging schedule.
///
/// # Example
///
/// ```no_run
/// use ebus_algo::schedule::{ChargingScheduler, GoodLpBackend};
/// # fn run(input: &ebus_core::ScheduleInput, config: &ebus_core::SchedulerConfig) -> ebus_core::SchedResult<()> {
/// let outcome = ChargingScheduler::new(input, config).solve(&GoodLpBackend::default())?;
/// println!("non-renewable energy: {:.2} kWh", outcome.objective_value);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ChargingScheduler<'a> {
    input: &'a ScheduleInput,
    config: &'a SchedulerConfig,
    prior: Option<&'a ScheduleResult>,
    warm_start: Option<&'a ScheduleResult>,
}

impl<'a> ChargingScheduler<'a> {
    pub fn new(input: &'a ScheduleInput, config: &'a SchedulerConfig) -> Self {
        Self {
            input,
            config,
            prior: None,
            warm_start: None,
        }
    }

    /// Result whose decisions before `horizonStartTime` are pinned when
    /// `recalculate` is set.
    pub fn with_prior(mut self, prior: &'a ScheduleResult) -> Self {
        self.prior = Some(prior);
        self
    }

    /// Result offered to the solver as initial values.
    pub fn with_warm_start(mut self, seed: &'a ScheduleResult) -> Self {
        self.warm_start = Some(seed);
        self
    }

    /// Build the model, applying rolling-horizon state fixing if requested.
    pub fn formulate(&self) -> SchedResult<Formulation> {
        let prior = match (self.config.recalculate, self.prior) {
            (true, None) => {
                return Err(SchedError::config(
                    "recalculate is set but no prior result was provided",
                ))
            }
            (true, Some(prior)) => Some(prior),
            (false, _) => None,
        };

        let mut formulation = Formulation::build(self.input, self.config)?;
        if let Some(prior) = prior {
            let pinned =
                pin_prior_decisions(&mut formulation, prior, self.config.horizon_start_time)?;
            info!(
                pinned,
                checkpoint = self.config.horizon_start_time,
                "pinned stops from prior schedule"
            );
        }
        Ok(formulation)
    }

    /// Formulate, solve with `backend` and extract the result record.
    pub fn solve<B: MipBackend + ?Sized>(&self, backend: &B) -> SchedResult<ScheduleOutcome> {
        let formulation = self.formulate()?;

        let mut options = SolveOptions::from_config(self.config);
        if let Some(seed) = self.warm_start {
            options.warm_start = warm_start_values(&formulation.vars, seed);
        }

        let start = Instant::now();
        let outcome = backend.solve(&formulation.model, &options)?;
        let solve_time = start.elapsed();

        info!(
            solver = backend.name(),
            status = %outcome.status,
            objective = outcome.objective_value,
            elapsed = ?solve_time,
            "charging schedule solved"
        );

        Ok(ScheduleOutcome {
            result: extract_result(&formulation, self.input, &outcome.values),
            objective_value: outcome.objective_value,
            status: outcome.status,
            relative_gap: outcome.relative_gap,
            solve_time,
        })
    }
}
