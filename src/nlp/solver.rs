//! Capability interface for nonlinear feasibility solvers

use super::constraints::QuadraticConstraint;
use super::variables::{VarId, VariableDecl};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Status reported by a solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// `solve` has not been called yet
    NotSolved,
    /// A feasible assignment was found
    Optimal,
    /// No assignment exists within the solver's precision
    Infeasible,
    /// The time budget ran out before a decision
    TimeLimit,
    /// The solver gave up without a decision
    Unknown,
}

impl SolverStatus {
    pub fn is_feasible(self) -> bool {
        self == SolverStatus::Optimal
    }
}

/// Minimal interface a continuous solver must offer to recognize disk graphs.
///
/// Any solver that accepts bounded continuous variables and quadratic
/// (in)equalities can sit behind this trait.
pub trait NonlinearSolver {
    /// Declare a continuous variable with inclusive bounds
    fn add_variable(&mut self, name: &str, lower: f64, upper: f64) -> Result<VarId>;

    /// Add a constraint over previously declared variables
    fn add_constraint(&mut self, constraint: QuadraticConstraint) -> Result<()>;

    /// Bound the wall-clock time of the next `solve`
    fn set_time_limit(&mut self, limit: Duration);

    /// Run the solver
    fn solve(&mut self) -> Result<SolverStatus>;

    /// Status of the last `solve`
    fn status(&self) -> SolverStatus;

    /// Value of a variable in the witness, available after an `Optimal` solve
    fn value(&self, var: VarId) -> Option<f64>;

    /// Get solver statistics
    fn statistics(&self) -> SolverStatistics;
}

/// Variables and constraints held by a built-in solver
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub variables: Vec<VariableDecl>,
    pub constraints: Vec<QuadraticConstraint>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: &str, lower: f64, upper: f64) -> Result<VarId> {
        if !(lower <= upper) || !lower.is_finite() || !upper.is_finite() {
            anyhow::bail!(
                "Variable {} has invalid bounds [{}, {}]",
                name,
                lower,
                upper
            );
        }
        self.variables.push(VariableDecl::new(name, lower, upper));
        Ok(VarId(self.variables.len() - 1))
    }

    pub fn add_constraint(&mut self, constraint: QuadraticConstraint) -> Result<()> {
        if let Some(var) = constraint
            .expr
            .variables()
            .find(|var| var.index() >= self.variables.len())
        {
            anyhow::bail!(
                "Constraint {} references undeclared variable {:?}",
                constraint.name,
                var
            );
        }
        self.constraints.push(constraint);
        Ok(())
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Smallest constraint slack at a point, `+∞` without constraints
    pub fn min_slack(&self, values: &[f64]) -> f64 {
        self.constraints
            .iter()
            .map(|c| c.slack(values))
            .fold(f64::INFINITY, f64::min)
    }

    /// Every constraint holds within `tolerance` and every variable lies in its bounds
    pub fn is_witness(&self, values: &[f64], tolerance: f64) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(decl, &v)| decl.lower <= v && v <= decl.upper)
            && self.constraints.iter().all(|c| c.is_satisfied(values, tolerance))
    }
}

/// Search parameters shared by the built-in backends
#[derive(Debug, Clone)]
pub struct SolverOptions {
    pub timeout: Option<Duration>,
    pub max_restarts: usize,
    pub max_iterations: usize,
    pub node_limit: usize,
    pub random_seed: u64,
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            max_restarts: 200,
            max_iterations: 2000,
            node_limit: 20_000,
            random_seed: 42,
            tolerance: 0.0,
        }
    }
}

/// Result of one search strategy over a model
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Witness(Vec<f64>),
    Infeasible,
    TimeLimit,
    Exhausted,
}

impl SearchOutcome {
    pub fn status(&self) -> SolverStatus {
        match self {
            SearchOutcome::Witness(_) => SolverStatus::Optimal,
            SearchOutcome::Infeasible => SolverStatus::Infeasible,
            SearchOutcome::TimeLimit => SolverStatus::TimeLimit,
            SearchOutcome::Exhausted => SolverStatus::Unknown,
        }
    }
}

/// Point in time after which a search must stop
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn after(timeout: Option<Duration>) -> Self {
        Self(timeout.map(|t| Instant::now() + t))
    }

    pub fn none() -> Self {
        Self(None)
    }

    /// Whether a time limit was set at all
    pub fn is_bounded(&self) -> bool {
        self.0.is_some()
    }

    pub fn expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

/// Statistics about the solving process
#[derive(Debug, Clone)]
pub struct SolverStatistics {
    pub backend: &'static str,
    pub variable_count: usize,
    pub constraint_count: usize,
    pub solve_time: Duration,
    pub boxes_explored: usize,
    pub restarts: usize,
    pub status: SolverStatus,
}

impl SolverStatistics {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            variable_count: 0,
            constraint_count: 0,
            solve_time: Duration::ZERO,
            boxes_explored: 0,
            restarts: 0,
            status: SolverStatus::NotSolved,
        }
    }
}

impl fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solver Statistics ({}):", self.backend)?;
        writeln!(f, "  Variables: {}", self.variable_count)?;
        writeln!(f, "  Constraints: {}", self.constraint_count)?;
        writeln!(f, "  Boxes explored: {}", self.boxes_explored)?;
        writeln!(f, "  Restarts: {}", self.restarts)?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        writeln!(f, "  Status: {:?}", self.status)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::constraints::{LinearExpr, QuadraticExpr, Sense};

    #[test]
    fn test_model_rejects_bad_bounds() {
        let mut model = Model::new();
        assert!(model.add_variable("x1", 2.0, 1.0).is_err());
        assert!(model.add_variable("x1", f64::NEG_INFINITY, 1.0).is_err());
        assert_eq!(model.add_variable("x1", 1.0, 2.0).unwrap(), VarId(0));
        assert_eq!(model.variable_count(), 1);
    }

    #[test]
    fn test_model_rejects_undeclared_variables() {
        let mut model = Model::new();
        let x = model.add_variable("x1", 0.0, 1.0).unwrap();
        let expr = QuadraticExpr::new().add_square(1.0, LinearExpr::difference(x, VarId(5)));

        assert!(model
            .add_constraint(QuadraticConstraint::new("bad", expr, Sense::LessEq, 1.0))
            .is_err());
        assert_eq!(model.constraint_count(), 0);
    }

    #[test]
    fn test_witness_check() {
        let mut model = Model::new();
        let a = model.add_variable("a", 0.0, 3.0).unwrap();
        let b = model.add_variable("b", 0.0, 3.0).unwrap();
        let expr = QuadraticExpr::new().add_square(1.0, LinearExpr::difference(a, b));
        model
            .add_constraint(QuadraticConstraint::new("gap", expr, Sense::GreaterEq, 4.0))
            .unwrap();

        assert!(model.is_witness(&[0.0, 2.0], 0.0));
        assert!(!model.is_witness(&[0.0, 1.0], 0.0));
        assert!(!model.is_witness(&[0.0, 4.0], 0.0));
        assert_eq!(model.min_slack(&[0.0, 3.0]), 5.0);
    }

    #[test]
    fn test_deadline() {
        assert!(!Deadline::none().is_bounded());
        assert!(!Deadline::none().expired());

        let deadline = Deadline::after(Some(Duration::ZERO));
        assert!(deadline.is_bounded());
        assert!(deadline.expired());
        assert!(!Deadline::after(Some(Duration::from_secs(60))).expired());
    }

    #[test]
    fn test_empty_model_min_slack() {
        let model = Model::new();
        assert_eq!(model.min_slack(&[]), f64::INFINITY);
        assert!(model.is_witness(&[], 0.0));
    }
}
