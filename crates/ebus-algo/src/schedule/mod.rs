//! Electric Bus Charging Schedule (MIP)
//!
//! This module builds and solves a Mixed-Integer Linear Programming (MILP)
//! formulation that decides when, where and for how long each bus of a
//! timetabled fleet charges, and how much of that energy comes from windows
//! of surplus clean energy.
//!
//! ## Problem Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ELECTRIC BUS CHARGING SCHEDULE                                          │
//! │  ──────────────────────────────                                          │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Timetabled routes (stations, scheduled arrivals, driver rests)      │
//! │    • Stations with chargers installed                                    │
//! │    • Trip energy cost and trip time between stations                     │
//! │    • Clean energy windows [start, end) with an energy budget             │
//! │                                                                          │
//! │  Decide (per bus and stop):                                              │
//! │    • Actual arrival and deviation from the timetable                     │
//! │    • Whether to charge, for how long, and how much energy                │
//! │    • How much of that energy is drawn from each window                   │
//! │                                                                          │
//! │  Minimize:                                                               │
//! │    Σ non-renewable energy over all buses and stops                       │
//! │                                                                          │
//! │  Subject to:                                                             │
//! │    • Battery limits and capacity continuity along the route              │
//! │    • Travel time and bounded deviation from the timetable                │
//! │    • One bus per charger at a time                                       │
//! │    • Window timing, sequencing and energy budgets                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## MILP Formulation
//!
//! For bus `b`, stop `i` (previous stop `j = i-1`) and window `k`:
//!
//! ```text
//! minimize    Σ_b Σ_i nr[b,i]
//!
//! subject to:
//!   cap[b,0] = startCap,  arr[b,0] = sched[b,0],  dev[b,0] = 0      Route start
//!   cap[b,i] + amt[b,i] ≤ maxCap,  cap[b,i] ≥ minCap                Battery limits
//!   minCT·x ≤ ct ≤ maxCT·x,  amt ≤ rate·ct,  x ≤ installed          Charge linkage
//!   cap[i] ≤ cap[j] + amt[j] - tripCost(j,i)                        Capacity continuity
//!   arr[i] ≥ arr[j] + ct[j] + min(sched[i]-sched[j], tripTime(j,i)) Travel time
//!   dev[i] ≥ |arr[i] - sched[i]|                                    Deviation
//!   nr ≤ amt,  nr ≥ amt - Σ_k we[k] (- disc)                        Non-renewable share
//!   Σ_b Σ_i we[b,i,k] ≤ available[k]                                Window budget
//!   Σ_i amt[b,i] ≥ Σ tripCost + minCap - startCap                   Energy sufficiency
//! ```
//!
//! ## Big-M Constraints
//!
//! Window usage `kt ∈ {0,1}` switches the window rows on:
//!
//! ```text
//!   arr + ct + M(1-kt) ≥ start[k]                      charging overlaps the window
//!   arr - M(1-kt) ≤ end[k]                             arrival before the window closes
//!   end[k] - arr - Σ_{k'<k} wt[k'] + M(1-kt) ≥ wt[k]   windows consumed in order
//!   arr + ct - start[k] + M(1-kt) ≥ wt[k]              charging inside the window
//!   wt[k] ≤ kt,  we[k] ≤ rate·kt,  wt[k] ≤ maxCT·kt     usage only through the flag
//! ```
//!
//! Two buses sharing a station within `2·(maxCT + dev)` of each other get
//! `same, ra, rb ∈ {0,1}`:
//!
//! ```text
//!   same ≤ x_a,  same ≤ x_b,  x_a + x_b ≤ same + 1
//!   arr_a ≥ arr_b + ct_b - M·ra
//!   arr_b ≥ arr_a + ct_a - M·rb
//!   ra + rb + same ≤ 2
//! ```
//!
//! When both charge, at least one ordering must hold. The value of `M` is
//! configuration (`bigM`); too small silently tightens the model.
//!
//! ## SPM Variant
//!
//! Adds `ase ∈ {0,1}` and a discount per stop:
//! `arr + M·ase ≥ horizonEnd`, `disc ≤ discountFactor·amt`,
//! `disc ≤ M(1-ase)`. Only stops at or past the horizon end may discount.

pub mod extract;
pub mod formulation;
pub mod mip;
pub mod objective;
pub mod pipeline;
pub mod rolling;
pub mod solver;
pub mod variables;

pub use extract::extract_result;
pub use formulation::{Formulation, FormulationStats, StationConflict};
pub use mip::{Assignment, Constraint, LinExpr, MipModel, Sense, VarDef, VarId, VarKind};
pub use objective::non_renewable_objective;
pub use pipeline::{ChargingScheduler, ScheduleOutcome};
pub use rolling::{pin_prior_decisions, warm_start_values};
pub use solver::{
    GoodLpBackend, MipBackend, MipSolverKind, SolveOptions, SolveOutcome, SolveStatus,
};
pub use variables::{BusVars, StopVars, VariablePool, WindowVars};
