//! # ebus-algo: Charging Schedule Algorithms
//!
//! Turns an [`ebus_core::ScheduleInput`] and [`ebus_core::SchedulerConfig`]
//! into a mixed-integer model, solves it and reads the assignment back into
//! an [`ebus_core::ScheduleResult`].
//!
//! - [`schedule::VariablePool`]: decision variable allocation
//! - [`schedule::Formulation`]: constraint generation and objective
//! - [`schedule::pin_prior_decisions`]: rolling-horizon state fixing
//! - [`schedule::extract_result`]: solution extraction
//! - [`schedule::GoodLpBackend`]: solver adapter over `good_lp`
//! - [`schedule::ChargingScheduler`]: all of the above in one call

pub use ebus_core::{SchedError, SchedResult};

pub mod schedule;

pub use schedule::{
    ChargingScheduler, Formulation, GoodLpBackend, MipBackend, MipSolverKind, ScheduleOutcome,
    SolveOptions, SolveStatus,
};
