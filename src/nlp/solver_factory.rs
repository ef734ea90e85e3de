//! Factory for creating solver instances based on configuration

use super::constraints::QuadraticConstraint;
use super::interval::IntervalSearch;
use super::local_search::LocalSearch;
#[cfg(feature = "scip")]
use super::scip_solver::ScipSolver;
use super::solver::{
    Deadline, Model, NonlinearSolver, SearchOutcome, SolverOptions, SolverStatistics, SolverStatus,
};
use super::variables::VarId;
use crate::config::{SolverBackend, SolverConfig};
use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Unified solver interface that can use different backends
pub enum UnifiedSolver {
    BuiltIn(BuiltInSolver),
    #[cfg(feature = "scip")]
    Scip(ScipSolver),
}

impl UnifiedSolver {
    /// Create a new solver instance based on the specified backend
    pub fn new(backend: SolverBackend, options: SolverOptions) -> Result<Self> {
        let strategy = match backend {
            SolverBackend::Hybrid => SearchStrategy::Hybrid,
            SolverBackend::LocalSearch => SearchStrategy::LocalSearch,
            SolverBackend::Interval => SearchStrategy::Interval,
            #[cfg(feature = "scip")]
            SolverBackend::Scip => return Ok(UnifiedSolver::Scip(ScipSolver::new(&options))),
            #[cfg(not(feature = "scip"))]
            SolverBackend::Scip => {
                anyhow::bail!("The scip backend is unavailable: built without the `scip` feature")
            }
        };
        Ok(UnifiedSolver::BuiltIn(BuiltInSolver::new(strategy, options)))
    }

    /// Create a solver from the solver section of the settings
    pub fn from_config(config: &SolverConfig) -> Result<Self> {
        let options = SolverOptions {
            timeout: config.time_limit(),
            max_restarts: config.max_restarts,
            max_iterations: config.max_iterations,
            node_limit: config.node_limit,
            random_seed: config.seed,
            tolerance: config.tolerance,
        };
        Self::new(config.backend, options)
    }

    /// Get the backend type being used
    pub fn backend(&self) -> SolverBackend {
        match self {
            UnifiedSolver::BuiltIn(solver) => match solver.strategy() {
                SearchStrategy::Hybrid => SolverBackend::Hybrid,
                SearchStrategy::LocalSearch => SolverBackend::LocalSearch,
                SearchStrategy::Interval => SolverBackend::Interval,
            },
            #[cfg(feature = "scip")]
            UnifiedSolver::Scip(_) => SolverBackend::Scip,
        }
    }
}

impl NonlinearSolver for UnifiedSolver {
    fn add_variable(&mut self, name: &str, lower: f64, upper: f64) -> Result<VarId> {
        match self {
            UnifiedSolver::BuiltIn(solver) => solver.add_variable(name, lower, upper),
            #[cfg(feature = "scip")]
            UnifiedSolver::Scip(solver) => solver.add_variable(name, lower, upper),
        }
    }

    fn add_constraint(&mut self, constraint: QuadraticConstraint) -> Result<()> {
        match self {
            UnifiedSolver::BuiltIn(solver) => solver.add_constraint(constraint),
            #[cfg(feature = "scip")]
            UnifiedSolver::Scip(solver) => solver.add_constraint(constraint),
        }
    }

    fn set_time_limit(&mut self, limit: Duration) {
        match self {
            UnifiedSolver::BuiltIn(solver) => solver.set_time_limit(limit),
            #[cfg(feature = "scip")]
            UnifiedSolver::Scip(solver) => solver.set_time_limit(limit),
        }
    }

    fn solve(&mut self) -> Result<SolverStatus> {
        match self {
            UnifiedSolver::BuiltIn(solver) => solver.solve(),
            #[cfg(feature = "scip")]
            UnifiedSolver::Scip(solver) => solver.solve(),
        }
    }

    fn status(&self) -> SolverStatus {
        match self {
            UnifiedSolver::BuiltIn(solver) => solver.status(),
            #[cfg(feature = "scip")]
            UnifiedSolver::Scip(solver) => solver.status(),
        }
    }

    fn value(&self, var: VarId) -> Option<f64> {
        match self {
            UnifiedSolver::BuiltIn(solver) => solver.value(var),
            #[cfg(feature = "scip")]
            UnifiedSolver::Scip(solver) => solver.value(var),
        }
    }

    fn statistics(&self) -> SolverStatistics {
        match self {
            UnifiedSolver::BuiltIn(solver) => solver.statistics(),
            #[cfg(feature = "scip")]
            UnifiedSolver::Scip(solver) => solver.statistics(),
        }
    }
}

/// Search strategies of the built-in solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Budgeted interval search, then local search
    Hybrid,
    LocalSearch,
    Interval,
}

impl SearchStrategy {
    fn name(self) -> &'static str {
        match self {
            SearchStrategy::Hybrid => "hybrid",
            SearchStrategy::LocalSearch => "local-search",
            SearchStrategy::Interval => "interval",
        }
    }
}

/// In-process solver built from the interval and local searches.
///
/// Without a time limit each search stops at its count budget. With one, the
/// last search of the strategy runs until the limit; the interval search of
/// the hybrid strategy keeps its node budget so local search gets the rest.
pub struct BuiltInSolver {
    strategy: SearchStrategy,
    options: SolverOptions,
    model: Model,
    status: SolverStatus,
    values: Option<Vec<f64>>,
    statistics: SolverStatistics,
}

impl BuiltInSolver {
    pub fn new(strategy: SearchStrategy, options: SolverOptions) -> Self {
        Self {
            strategy,
            options,
            model: Model::new(),
            status: SolverStatus::NotSolved,
            values: None,
            statistics: SolverStatistics::new(strategy.name()),
        }
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    fn run(&mut self, deadline: Deadline) -> SearchOutcome {
        let local = LocalSearch::new(&self.options);

        match self.strategy {
            SearchStrategy::Interval => {
                let node_limit = if deadline.is_bounded() {
                    usize::MAX
                } else {
                    self.options.node_limit
                };
                let (outcome, explored) = IntervalSearch::new(node_limit).search(&self.model, deadline);
                self.statistics.boxes_explored = explored;
                self.verified(outcome)
            }
            SearchStrategy::LocalSearch => {
                let (outcome, restarts) = local.search(&self.model, deadline);
                self.statistics.restarts = restarts;
                self.verified(outcome)
            }
            SearchStrategy::Hybrid => {
                let interval = IntervalSearch::new(self.options.node_limit);
                let (outcome, explored) = interval.search(&self.model, deadline);
                self.statistics.boxes_explored = explored;
                match self.verified(outcome) {
                    SearchOutcome::Exhausted => {
                        debug!(explored, "interval search undecided, falling back to local search");
                        let (outcome, restarts) = local.search(&self.model, deadline);
                        self.statistics.restarts = restarts;
                        self.verified(outcome)
                    }
                    decided => decided,
                }
            }
        }
    }

    /// Re-check a witness point against the model before reporting it
    fn verified(&self, outcome: SearchOutcome) -> SearchOutcome {
        match outcome {
            SearchOutcome::Witness(values)
                if !self.model.is_witness(&values, self.options.tolerance) =>
            {
                warn!("search returned a point that fails verification");
                SearchOutcome::Exhausted
            }
            outcome => outcome,
        }
    }
}

impl NonlinearSolver for BuiltInSolver {
    fn add_variable(&mut self, name: &str, lower: f64, upper: f64) -> Result<VarId> {
        self.model.add_variable(name, lower, upper)
    }

    fn add_constraint(&mut self, constraint: QuadraticConstraint) -> Result<()> {
        self.model.add_constraint(constraint)
    }

    fn set_time_limit(&mut self, limit: Duration) {
        self.options.timeout = Some(limit);
    }

    fn solve(&mut self) -> Result<SolverStatus> {
        let start_time = Instant::now();
        let deadline = Deadline::after(self.options.timeout);

        info!(
            backend = self.strategy.name(),
            variables = self.model.variable_count(),
            constraints = self.model.constraint_count(),
            "solving"
        );

        let outcome = self.run(deadline);
        self.status = outcome.status();
        self.values = match outcome {
            SearchOutcome::Witness(values) => Some(values),
            _ => None,
        };

        self.statistics.variable_count = self.model.variable_count();
        self.statistics.constraint_count = self.model.constraint_count();
        self.statistics.solve_time = start_time.elapsed();
        self.statistics.status = self.status;

        info!(
            status = ?self.status,
            seconds = self.statistics.solve_time.as_secs_f64(),
            "solver finished"
        );
        Ok(self.status)
    }

    fn status(&self) -> SolverStatus {
        self.status
    }

    fn value(&self, var: VarId) -> Option<f64> {
        self.values.as_ref()?.get(var.index()).copied()
    }

    fn statistics(&self) -> SolverStatistics {
        self.statistics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::constraints::{LinearExpr, QuadraticExpr, Sense};

    fn add_gap(solver: &mut impl NonlinearSolver, upper: f64, min_gap_squared: f64) -> (VarId, VarId) {
        let a = solver.add_variable("a", 0.0, upper).unwrap();
        let b = solver.add_variable("b", 0.0, upper).unwrap();
        let expr = QuadraticExpr::new().add_square(1.0, LinearExpr::difference(a, b));
        solver
            .add_constraint(QuadraticConstraint::new(
                "gap",
                expr,
                Sense::GreaterEq,
                min_gap_squared,
            ))
            .unwrap();
        (a, b)
    }

    #[test]
    fn test_solver_creation() {
        let solver = UnifiedSolver::from_config(&SolverConfig::default()).unwrap();
        assert_eq!(solver.backend(), SolverBackend::Hybrid);
        assert_eq!(solver.status(), SolverStatus::NotSolved);
        assert_eq!(solver.value(VarId(0)), None);
        assert_eq!(solver.statistics().backend, "hybrid");
    }

    #[cfg(not(feature = "scip"))]
    #[test]
    fn test_scip_backend_needs_feature() {
        assert!(UnifiedSolver::new(SolverBackend::Scip, SolverOptions::default()).is_err());
    }

    #[test]
    fn test_each_backend_finds_witness() {
        for backend in [
            SolverBackend::Hybrid,
            SolverBackend::LocalSearch,
            SolverBackend::Interval,
        ] {
            let mut solver = UnifiedSolver::new(backend, SolverOptions::default()).unwrap();
            assert_eq!(solver.backend(), backend);
            let (a, b) = add_gap(&mut solver, 4.0, 1.0);

            assert_eq!(solver.solve().unwrap(), SolverStatus::Optimal, "{:?}", backend);
            let gap = solver.value(a).unwrap() - solver.value(b).unwrap();
            assert!(gap * gap >= 1.0);
            assert_eq!(solver.statistics().status, SolverStatus::Optimal);
        }
    }

    #[test]
    fn test_hybrid_proves_infeasibility() {
        let mut solver = BuiltInSolver::new(SearchStrategy::Hybrid, SolverOptions::default());
        let (a, _) = add_gap(&mut solver, 1.0, 4.0);

        assert_eq!(solver.solve().unwrap(), SolverStatus::Infeasible);
        assert_eq!(solver.value(a), None);
        assert_eq!(solver.statistics().restarts, 0);
        assert_eq!(solver.model().constraint_count(), 1);
    }

    #[test]
    fn test_local_search_reports_unknown() {
        let options = SolverOptions {
            max_restarts: 3,
            max_iterations: 50,
            ..Default::default()
        };
        let mut solver = BuiltInSolver::new(SearchStrategy::LocalSearch, options);
        add_gap(&mut solver, 1.0, 4.0);

        assert_eq!(solver.solve().unwrap(), SolverStatus::Unknown);
        assert_eq!(solver.statistics().restarts, 3);
    }

    #[test]
    fn test_time_limit() {
        let options = SolverOptions {
            max_restarts: usize::MAX,
            ..Default::default()
        };
        let mut solver = BuiltInSolver::new(SearchStrategy::LocalSearch, options);
        add_gap(&mut solver, 1.0, 4.0);
        solver.set_time_limit(Duration::from_millis(20));

        assert_eq!(solver.solve().unwrap(), SolverStatus::TimeLimit);
    }

    #[test]
    fn test_time_limit_lifts_node_limit() {
        let options = SolverOptions {
            node_limit: 1,
            ..Default::default()
        };
        let mut capped = BuiltInSolver::new(SearchStrategy::Interval, options.clone());
        add_gap(&mut capped, 4.0, 1.0);
        assert_eq!(capped.solve().unwrap(), SolverStatus::Unknown);

        let mut timed = BuiltInSolver::new(SearchStrategy::Interval, options);
        add_gap(&mut timed, 4.0, 1.0);
        timed.set_time_limit(Duration::from_secs(5));
        assert_eq!(timed.solve().unwrap(), SolverStatus::Optimal);
        assert!(timed.statistics().boxes_explored > 1);
    }
}
