//! Unified error types for the charging scheduler
//!
//! Every fallible operation in the workspace returns [`SchedResult`]. Fatal
//! input problems are reported before any model is handed to a solver; solver
//! outcomes that still carry an assignment (time limit, solution limit) are
//! not errors and travel on the solve outcome instead.
//!
//! # Example
//!
//! ```ignore
//! use ebus_core::{SchedError, SchedResult};
//!
//! fn plan(map: &HashMap<String, String>) -> SchedResult<()> {
//!     let config = SchedulerConfig::from_map(map)?;
//!     let input = load_input(&config)?;
//!     solve(&input, &config)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Error type for all scheduling operations.
#[derive(Error, Debug)]
pub enum SchedError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or invalid configuration key, malformed CEW specification,
    /// non-positive bounds
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mismatched sequence lengths, station index out of range, missing
    /// distance entries
    #[error("Data consistency error: {0}")]
    DataConsistency(String),

    /// The solver proved that no feasible assignment exists
    #[error("Model infeasible ({status}): {message}")]
    Infeasible { status: String, message: String },

    /// Solver failures other than infeasibility
    #[error("Solver error: {0}")]
    Solver(String),
}

impl SchedError {
    /// Shorthand for a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        SchedError::Config(msg.into())
    }

    /// Shorthand for a data consistency error.
    pub fn data(msg: impl Into<String>) -> Self {
        SchedError::DataConsistency(msg.into())
    }

    /// Whether this error was raised before model construction could finish.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SchedError::Config(_) | SchedError::DataConsistency(_) | SchedError::Parse(_)
        )
    }
}

/// Convenience type alias for Results using SchedError.
pub type SchedResult<T> = Result<T, SchedError>;

impl From<anyhow::Error> for SchedError {
    fn from(err: anyhow::Error) -> Self {
        SchedError::Solver(err.to_string())
    }
}

impl From<serde_json::Error> for SchedError {
    fn from(err: serde_json::Error) -> Self {
        SchedError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedError::config("chargeRate must be positive");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("chargeRate"));
    }

    #[test]
    fn test_infeasible_display_carries_status() {
        let err = SchedError::Infeasible {
            status: "infeasible".into(),
            message: "no assignment".into(),
        };
        assert_eq!(
            err.to_string(),
            "Model infeasible (infeasible): no assignment"
        );
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SchedError = io_err.into();
        assert!(matches!(err, SchedError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> SchedResult<()> {
            Err(SchedError::data("bus 3 has 2 stops but 3 times"))
        }

        fn outer() -> SchedResult<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert!(err.is_input_error());
    }
}
