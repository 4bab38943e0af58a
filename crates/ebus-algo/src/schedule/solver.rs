//! MIP solver backends.
//!
//! [`MipBackend`] is the seam between the formulation and a concrete solver.
//! [`GoodLpBackend`] translates a [`MipModel`] into a `good_lp` problem and
//! runs the selected solver. `microlp` (pure Rust) is always available;
//! HiGHS is enabled with the `solver-highs` feature.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use ebus_core::{SchedError, SchedulerConfig};
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus,
    SolverModel, Variable,
};
use tracing::{debug, warn};

use super::mip::{LinExpr, MipModel, Sense, VarId, VarKind};
use crate::SchedResult;

/// How a solve finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal
    Optimal,
    /// Feasible, optimality not proven
    Feasible,
    /// Stopped by the time limit; best assignment returned
    TimedOut,
    /// Stopped by the solution limit; best assignment returned
    SolutionLimit,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Feasible => write!(f, "feasible"),
            SolveStatus::TimedOut => write!(f, "timed_out"),
            SolveStatus::SolutionLimit => write!(f, "solution_limit"),
        }
    }
}

/// Pass-through solver options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveOptions {
    /// Wall-clock limit
    pub time_limit: Option<Duration>,
    /// Stop after this many improving solutions
    pub solution_limit: Option<u32>,
    /// Initial values offered to the solver
    pub warm_start: Vec<(VarId, f64)>,
}

impl SolveOptions {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            time_limit: config.timeout_seconds.map(Duration::from_secs),
            solution_limit: config.max_solutions,
            warm_start: Vec::new(),
        }
    }
}

/// Assignment returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub objective_value: f64,
    /// Relative MIP gap, when the backend reports one
    pub relative_gap: Option<f64>,
    /// One value per model variable, indexed by [`VarId`]
    pub values: Vec<f64>,
}

/// A solver able to minimise a [`MipModel`].
pub trait MipBackend {
    fn name(&self) -> &str;

    /// Solve `model`. Infeasibility is reported as [`SchedError::Infeasible`].
    fn solve(&self, model: &MipModel, options: &SolveOptions) -> SchedResult<SolveOutcome>;
}

/// Solvers reachable through `good_lp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MipSolverKind {
    #[default]
    Microlp,
    #[cfg(feature = "solver-highs")]
    Highs,
}

impl MipSolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_MIP_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MipSolverKind::Microlp => "microlp",
            #[cfg(feature = "solver-highs")]
            MipSolverKind::Highs => "highs",
        }
    }
}

const AVAILABLE_MIP_SOLVERS: &[&str] = &[
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

fn unknown_solver_error(label: &str) -> anyhow::Error {
    anyhow!(
        "unknown mip solver '{}'; supported values: {}",
        label,
        MipSolverKind::available().join(", ")
    )
}

impl FromStr for MipSolverKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "microlp" => Ok(MipSolverKind::Microlp),
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(MipSolverKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_solver_error(&normalized))
                }
            }
            other => Err(unknown_solver_error(other)),
        }
    }
}

impl fmt::Display for MipSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend that solves through `good_lp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpBackend {
    kind: MipSolverKind,
}

impl GoodLpBackend {
    pub fn new(kind: MipSolverKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> MipSolverKind {
        self.kind
    }
}

fn to_expression(expr: &LinExpr, vars: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant_term());
    for &(var, coef) in expr.terms() {
        out += coef * vars[var.index()];
    }
    out
}

fn to_constraints(model: &MipModel, vars: &[Variable]) -> Vec<good_lp::Constraint> {
    model
        .constraints()
        .iter()
        .map(|c| {
            let lhs = to_expression(&c.expr, vars);
            match c.sense {
                Sense::Le => constraint!(lhs <= c.rhs),
                Sense::Ge => constraint!(lhs >= c.rhs),
                Sense::Eq => constraint!(lhs == c.rhs),
            }
        })
        .collect()
}

fn resolution_error(err: ResolutionError) -> SchedError {
    match err {
        ResolutionError::Infeasible => SchedError::Infeasible {
            status: "infeasible".to_string(),
            message: "no assignment satisfies every constraint".to_string(),
        },
        other => SchedError::Solver(other.to_string()),
    }
}

/// Map the solver's stop reason onto [`SolveStatus`].
///
/// `good_lp` folds every HiGHS limit (time, solution count, iterations) into
/// `SolutionStatus::TimeLimit`; the configured limits tell them apart.
fn stop_reason(status: SolutionStatus, options: &SolveOptions, elapsed: Duration) -> SolveStatus {
    match status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        SolutionStatus::GapLimit => SolveStatus::Feasible,
        SolutionStatus::TimeLimit => match (options.time_limit, options.solution_limit) {
            (Some(limit), _) if elapsed >= limit => SolveStatus::TimedOut,
            (_, Some(_)) => SolveStatus::SolutionLimit,
            (Some(_), None) => SolveStatus::TimedOut,
            (None, None) => SolveStatus::Feasible,
        },
    }
}

impl MipBackend for GoodLpBackend {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn solve(&self, model: &MipModel, options: &SolveOptions) -> SchedResult<SolveOutcome> {
        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = model
            .vars()
            .iter()
            .map(|def| {
                let definition = variable().min(def.lower).max(def.upper).name(def.name.clone());
                match def.kind {
                    VarKind::Integer => problem.add(definition.integer()),
                    VarKind::Continuous => problem.add(definition),
                }
            })
            .collect();
        let objective = to_expression(model.objective(), &vars);
        let constraints = to_constraints(model, &vars);

        debug!(
            solver = self.kind.as_str(),
            variables = vars.len(),
            constraints = constraints.len(),
            "handing model to solver"
        );

        let start = Instant::now();
        let (values, status) = match self.kind {
            MipSolverKind::Microlp => {
                if options.time_limit.is_some() {
                    warn!("microlp does not support a time limit; ignoring timeout");
                }
                if options.solution_limit.is_some() {
                    warn!("microlp does not support a solution limit; ignoring maxSolutions");
                }
                if !options.warm_start.is_empty() {
                    debug!("microlp does not accept initial values; ignoring warm start");
                }

                let mut lp = problem
                    .minimise(objective)
                    .using(good_lp::solvers::microlp::microlp);
                for c in constraints {
                    lp = lp.with(c);
                }
                let solution = lp.solve().map_err(resolution_error)?;
                let values: Vec<f64> = vars.iter().map(|v| solution.value(*v)).collect();
                (values, stop_reason(solution.status(), options, start.elapsed()))
            }
            #[cfg(feature = "solver-highs")]
            MipSolverKind::Highs => {
                use good_lp::solvers::WithInitialSolution;

                let mut lp = problem
                    .minimise(objective)
                    .using(good_lp::solvers::highs::highs)
                    .set_verbose(false);
                if let Some(limit) = options.time_limit {
                    lp = lp.set_option("time_limit", limit.as_secs_f64());
                }
                if let Some(limit) = options.solution_limit {
                    lp = lp.set_option("mip_max_improving_sols", limit as i32);
                }
                if !options.warm_start.is_empty() {
                    lp = lp.with_initial_solution(
                        options
                            .warm_start
                            .iter()
                            .map(|&(var, value)| (vars[var.index()], value)),
                    );
                }
                for c in constraints {
                    lp = lp.with(c);
                }
                let solution = lp.solve().map_err(resolution_error)?;
                let values: Vec<f64> = vars.iter().map(|v| solution.value(*v)).collect();
                (values, stop_reason(solution.status(), options, start.elapsed()))
            }
        };

        debug!(elapsed = ?start.elapsed(), %status, "solver finished");

        Ok(SolveOutcome {
            status,
            objective_value: model.objective_value(&values),
            relative_gap: status.is_optimal().then_some(0.0),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_kind_parsing() {
        assert_eq!("microlp".parse::<MipSolverKind>().unwrap(), MipSolverKind::Microlp);
        assert_eq!("MicroLP".parse::<MipSolverKind>().unwrap(), MipSolverKind::Microlp);
        let err = "gurobi".parse::<MipSolverKind>().unwrap_err();
        assert!(err.to_string().contains("supported values: microlp"));
    }

    #[test]
    fn test_microlp_solves_small_mip() {
        // min x + 2y  s.t.  x + y >= 1.5, y binary, x <= 1
        let mut model = MipModel::new();
        let x = model.continuous("x", 0.0, 1.0);
        let y = model.binary("y");
        model.ge("cover", x + y, 1.5);
        model.set_objective(x + 2.0 * y);

        let outcome = GoodLpBackend::default()
            .solve(&model, &SolveOptions::default())
            .unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.values[x.index()] - 0.5).abs() < 1e-6);
        assert!((outcome.values[y.index()] - 1.0).abs() < 1e-6);
        assert!((outcome.objective_value - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_stop_reason_follows_configured_limits() {
        let none = SolveOptions::default();
        let solutions = SolveOptions {
            solution_limit: Some(3),
            ..SolveOptions::default()
        };
        let both = SolveOptions {
            time_limit: Some(Duration::from_secs(10)),
            solution_limit: Some(3),
            ..SolveOptions::default()
        };
        let early = Duration::from_secs(2);
        let late = Duration::from_secs(12);

        // a solution limit that never binds still ends proven optimal
        assert_eq!(stop_reason(SolutionStatus::Optimal, &solutions, early), SolveStatus::Optimal);
        assert_eq!(
            stop_reason(SolutionStatus::TimeLimit, &solutions, early),
            SolveStatus::SolutionLimit
        );
        assert_eq!(
            stop_reason(SolutionStatus::TimeLimit, &both, early),
            SolveStatus::SolutionLimit
        );
        assert_eq!(stop_reason(SolutionStatus::TimeLimit, &both, late), SolveStatus::TimedOut);
        assert_eq!(stop_reason(SolutionStatus::TimeLimit, &none, early), SolveStatus::Feasible);
        assert_eq!(stop_reason(SolutionStatus::GapLimit, &none, early), SolveStatus::Feasible);
    }

    #[test]
    fn test_infeasible_model_is_an_error() {
        let mut model = MipModel::new();
        let x = model.continuous("x", 0.0, 1.0);
        model.ge("impossible", x, 2.0);
        model.set_objective(LinExpr::from(x));

        let err = GoodLpBackend::default()
            .solve(&model, &SolveOptions::default())
            .unwrap_err();
        assert!(matches!(err, SchedError::Infeasible { .. }));
    }
}
