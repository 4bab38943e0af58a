//! Solver-independent mixed-integer model.
//!
//! The scheduler builds its formulation against this representation rather
//! than a particular solver crate. This keeps the emitted system inspectable:
//! constraints carry labels, and any assignment can be checked against the
//! model without a solver (see [`MipModel::violations`]).

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Index of a decision variable in its [`MipModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Integer,
}

/// A bounded decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub kind: VarKind,
}

impl VarDef {
    pub fn is_binary(&self) -> bool {
        self.kind == VarKind::Integer && self.lower == 0.0 && self.upper == 1.0
    }
}

/// Sparse linear expression `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(coef: f64, var: VarId) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, coef: f64, var: VarId) {
        self.terms.push((var, coef));
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of `var` after merging duplicate terms.
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }

    /// Variables referenced by this expression, in first-use order.
    pub fn variables(&self) -> Vec<VarId> {
        let mut seen = Vec::new();
        for (var, _) in &self.terms {
            if !seen.contains(var) {
                seen.push(*var);
            }
        }
        seen
    }

    pub fn evaluate<A: Assignment + ?Sized>(&self, assignment: &A) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * assignment.value(*var))
            .sum::<f64>()
            + self.constant
    }

    fn scale(mut self, factor: f64) -> Self {
        for (_, coef) in &mut self.terms {
            *coef *= factor;
        }
        self.constant *= factor;
        self
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        LinExpr::term(1.0, var)
    }
}

impl From<f64> for LinExpr {
    fn from(value: f64) -> Self {
        LinExpr::constant(value)
    }
}

impl<T: Into<LinExpr>> AddAssign<T> for LinExpr {
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl<T: Into<LinExpr>> SubAssign<T> for LinExpr {
    fn sub_assign(&mut self, rhs: T) {
        *self += rhs.into().scale(-1.0);
    }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: T) -> LinExpr {
        self += rhs;
        self
    }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
    type Output = LinExpr;

    fn sub(mut self, rhs: T) -> LinExpr {
        self -= rhs;
        self
    }
}

impl<T: Into<LinExpr>> Add<T> for VarId {
    type Output = LinExpr;

    fn add(self, rhs: T) -> LinExpr {
        LinExpr::from(self) + rhs
    }
}

impl<T: Into<LinExpr>> Sub<T> for VarId {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> LinExpr {
        LinExpr::from(self) - rhs
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        self.scale(rhs)
    }
}

impl Mul<LinExpr> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: LinExpr) -> LinExpr {
        rhs.scale(self)
    }
}

impl Mul<VarId> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: VarId) -> LinExpr {
        LinExpr::term(self, rhs)
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self.scale(-1.0)
    }
}

impl Sum for LinExpr {
    fn sum<I: Iterator<Item = LinExpr>>(iter: I) -> Self {
        iter.fold(LinExpr::new(), |acc, e| acc + e)
    }
}

impl Sum<VarId> for LinExpr {
    fn sum<I: Iterator<Item = VarId>>(iter: I) -> Self {
        iter.fold(LinExpr::new(), |acc, v| acc + v)
    }
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "=="),
        }
    }
}

/// A labelled linear constraint `expr (sense) rhs`; `expr` has no constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub label: String,
    pub expr: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// Normalise `lhs (sense) rhs` so that all variables sit on the left.
    pub fn new(
        label: impl Into<String>,
        lhs: impl Into<LinExpr>,
        sense: Sense,
        rhs: impl Into<LinExpr>,
    ) -> Self {
        let mut expr = lhs.into() - rhs.into();
        let rhs = -expr.constant;
        expr.constant = 0.0;
        Self {
            label: label.into(),
            expr,
            sense,
            rhs,
        }
    }

    /// Signed amount by which `assignment` violates this constraint (0 when satisfied).
    pub fn violation<A: Assignment + ?Sized>(&self, assignment: &A) -> f64 {
        let lhs = self.expr.evaluate(assignment);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }

    pub fn is_satisfied_by<A: Assignment + ?Sized>(&self, assignment: &A, tolerance: f64) -> bool {
        self.violation(assignment) <= tolerance
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.label)?;
        for (i, (var, coef)) in self.expr.terms().iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}*x{}", coef, var.0)?;
        }
        write!(f, " {} {}", self.sense, self.rhs)
    }
}

/// Source of variable values, indexed by [`VarId`].
pub trait Assignment {
    fn value(&self, var: VarId) -> f64;
}

impl Assignment for [f64] {
    fn value(&self, var: VarId) -> f64 {
        self[var.0]
    }
}

impl Assignment for Vec<f64> {
    fn value(&self, var: VarId) -> f64 {
        self[var.0]
    }
}

/// A minimisation model: variables, constraints and a linear objective.
#[derive(Debug, Clone, Default)]
pub struct MipModel {
    vars: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
}

impl MipModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(&mut self, name: impl Into<String>, lower: f64, upper: f64, kind: VarKind) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name: name.into(),
            lower,
            upper,
            kind,
        });
        id
    }

    pub fn continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name, lower, upper, VarKind::Continuous)
    }

    pub fn binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name, 0.0, 1.0, VarKind::Integer)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn le(&mut self, label: impl Into<String>, lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) {
        self.add_constraint(Constraint::new(label, lhs, Sense::Le, rhs));
    }

    pub fn ge(&mut self, label: impl Into<String>, lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) {
        self.add_constraint(Constraint::new(label, lhs, Sense::Ge, rhs));
    }

    pub fn eq(&mut self, label: impl Into<String>, lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) {
        self.add_constraint(Constraint::new(label, lhs, Sense::Eq, rhs));
    }

    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> &VarDef {
        &self.vars[id.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_binaries(&self) -> usize {
        self.vars.iter().filter(|v| v.is_binary()).count()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn find_var(&self, name: &str) -> Option<VarId> {
        self.vars.iter().position(|v| v.name == name).map(VarId)
    }

    /// Constraints whose label starts with `prefix`.
    pub fn constraints_labelled<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.label.starts_with(prefix))
    }

    pub fn objective_value<A: Assignment + ?Sized>(&self, assignment: &A) -> f64 {
        self.objective.evaluate(assignment)
    }

    /// Constraints violated by `assignment` beyond `tolerance`.
    pub fn violations<'a, A: Assignment + ?Sized>(
        &'a self,
        assignment: &A,
        tolerance: f64,
    ) -> Vec<&'a Constraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied_by(assignment, tolerance))
            .collect()
    }

    /// Variables whose value lies outside their bounds or off the integer grid.
    pub fn bound_violations<A: Assignment + ?Sized>(&self, assignment: &A, tolerance: f64) -> Vec<VarId> {
        self.vars
            .iter()
            .enumerate()
            .filter(|(i, def)| {
                let v = assignment.value(VarId(*i));
                v < def.lower - tolerance
                    || v > def.upper + tolerance
                    || (def.kind == VarKind::Integer && (v - v.round()).abs() > tolerance)
            })
            .map(|(i, _)| VarId(i))
            .collect()
    }

    /// Whether `assignment` satisfies every bound, integrality requirement and constraint.
    pub fn is_satisfied<A: Assignment + ?Sized>(&self, assignment: &A, tolerance: f64) -> bool {
        self.bound_violations(assignment, tolerance).is_empty()
            && self.violations(assignment, tolerance).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_moves_constants_right() {
        let mut model = MipModel::new();
        let x = model.continuous("x", 0.0, 10.0);
        let y = model.continuous("y", 0.0, 10.0);

        // x + 3 <= 2y - 1  =>  x - 2y <= -4
        model.le("c", x + 3.0, 2.0 * y - 1.0);
        let c = &model.constraints()[0];
        assert_eq!(c.sense, Sense::Le);
        assert_eq!(c.rhs, -4.0);
        assert_eq!(c.expr.coefficient(x), 1.0);
        assert_eq!(c.expr.coefficient(y), -2.0);
        assert_eq!(c.expr.constant_term(), 0.0);
    }

    #[test]
    fn test_violations() {
        let mut model = MipModel::new();
        let x = model.continuous("x", 0.0, 10.0);
        let b = model.binary("b");
        model.le("upper", x, 10.0 * b);
        model.eq("pin", x, 4.0);

        assert!(model.is_satisfied(&vec![4.0, 1.0], 1e-9));

        let off = vec![4.0, 0.0];
        let violated: Vec<&str> = model
            .violations(&off, 1e-9)
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(violated, vec!["upper"]);

        assert_eq!(model.bound_violations(&vec![4.0, 0.5], 1e-9), vec![b]);
        assert_eq!(model.bound_violations(&vec![11.0, 1.0], 1e-9), vec![x]);
    }

    #[test]
    fn test_expression_arithmetic() {
        let x = VarId(0);
        let y = VarId(1);
        let expr = -(2.0 * (x - y) + 1.0);
        assert_eq!(expr.coefficient(x), -2.0);
        assert_eq!(expr.coefficient(y), 2.0);
        assert_eq!(expr.constant_term(), -1.0);
        assert_eq!(expr.evaluate(&vec![3.0, 1.0]), -5.0);

        let total: LinExpr = [x, y, x].into_iter().sum();
        assert_eq!(total.coefficient(x), 2.0);
        assert_eq!(total.variables(), vec![x, y]);
    }

    #[test]
    fn test_binary_detection() {
        let mut model = MipModel::new();
        model.binary("b");
        model.add_var("n", 0.0, 5.0, VarKind::Integer);
        model.continuous("c", 0.0, 1.0);
        assert_eq!(model.num_binaries(), 1);
        assert_eq!(model.find_var("n"), Some(VarId(1)));
    }
}
