//! Objective assembly.

use super::mip::LinExpr;
use super::variables::VariablePool;

/// Total non-renewable energy over every bus and stop, to be minimised.
pub fn non_renewable_objective(vars: &VariablePool) -> LinExpr {
    vars.stops().map(|(_, _, s)| s.non_renewable).sum()
}
