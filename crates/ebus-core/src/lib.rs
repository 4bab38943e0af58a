//! # ebus-core: Electric Bus Charging Core
//!
//! Data structures shared by every stage of the charging scheduler.
//!
//! ## Contents
//!
//! - [`model`]: stations, distance matrix, charging plan and bus routes,
//!   validated into an immutable [`ScheduleInput`]
//! - [`window`]: clean energy windows and their specification string
//! - [`config`]: the string-keyed configuration map parsed into a typed
//!   [`SchedulerConfig`]
//! - [`result`]: the serializable [`ScheduleResult`] snapshot of a solve
//! - [`error`]: [`SchedError`] and [`SchedResult`]
//!
//! ## Quick Start
//!
//! ```rust
//! use ebus_core::*;
//!
//! let network = StationNetwork::new(
//!     vec!["Depot".to_string(), "Centre".to_string()],
//!     vec![vec![0.0, 10.0], vec![10.0, 0.0]],
//! )
//! .unwrap();
//!
//! let route = BusRoute::new(
//!     BusKey::new(1),
//!     vec![StationId::new(0), StationId::new(1)],
//!     vec![8.0, 9.0],
//!     vec![false, false],
//! );
//!
//! let input = ScheduleInput::new(
//!     network,
//!     ChargingPlan::new(vec![true, false]),
//!     vec![route],
//!     parse_cew_spec("7.5-8.5=120,", 1.0).unwrap(),
//! )
//! .unwrap();
//!
//! assert_eq!(input.num_buses(), 1);
//! assert_eq!(input.windows().len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod result;
pub mod window;

pub use config::{keys, FormulationMethod, SchedulerConfig};
pub use error::{SchedError, SchedResult};
pub use model::{
    BusKey, BusRoute, ChargingPlan, ScheduleInput, StationId, StationNetwork, TripTables,
};
pub use result::{
    BusSchedule, EnergyTotals, ScheduleResult, StationConflictRecord, WindowUsage,
};
pub use window::{parse_cew_spec, CleanEnergyWindow};
