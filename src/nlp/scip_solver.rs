//! SCIP backend through the `russcip` bindings
//!
//! SCIP runs spatial branch-and-bound over the nonconvex quadratic system, so
//! unlike the built-in searches it can prove that a graph has no realization.

use super::constraints::{QuadraticConstraint, Sense};
use super::solver::{Model, NonlinearSolver, SolverOptions, SolverStatistics, SolverStatus};
use super::variables::VarId;
use anyhow::{anyhow, Result};
use russcip::{Status, VarType};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Every constraint side is tightened by this much before SCIP sees it
const SIDE_MARGIN: f64 = 1e-6;

/// SCIP feasibility tolerance, well below `SIDE_MARGIN`
const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Solver that hands the quadratic system to SCIP
pub struct ScipSolver {
    model: Model,
    timeout: Option<Duration>,
    tolerance: f64,
    status: SolverStatus,
    values: Option<Vec<f64>>,
    statistics: SolverStatistics,
}

impl ScipSolver {
    pub fn new(options: &SolverOptions) -> Self {
        Self {
            model: Model::new(),
            timeout: options.timeout,
            tolerance: options.tolerance,
            status: SolverStatus::NotSolved,
            values: None,
            statistics: SolverStatistics::new("scip"),
        }
    }

    /// Build the SCIP problem, solve it and read back a witness if there is one
    fn run(&self) -> Result<(SolverStatus, Option<Vec<f64>>)> {
        let mut scip = russcip::Model::new()
            .hide_output()
            .include_default_plugins()
            .create_prob("disk_realization")
            .set_real_param("numerics/feastol", FEASIBILITY_TOLERANCE)
            .map_err(|code| anyhow!("Failed to set SCIP feasibility tolerance: {:?}", code))?;
        if let Some(limit) = self.timeout {
            scip = scip
                .set_real_param("limits/time", limit.as_secs_f64())
                .map_err(|code| anyhow!("Failed to set SCIP time limit: {:?}", code))?;
        }

        let vars: Vec<_> = self
            .model
            .variables
            .iter()
            .map(|decl| scip.add_var(decl.lower, decl.upper, 0.0, &decl.name, VarType::Continuous))
            .collect();

        for constraint in &self.model.constraints {
            let monomials = constraint.expr.monomials();
            let lin_vars = monomials.linear.keys().map(|v| &vars[v.index()]).collect();
            let mut lin_coefs: Vec<f64> = monomials.linear.values().copied().collect();
            let (quad_vars_1, quad_vars_2): (Vec<_>, Vec<_>) = monomials
                .bilinear
                .keys()
                .map(|(a, b)| (&vars[a.index()], &vars[b.index()]))
                .unzip();
            let mut quad_coefs: Vec<f64> = monomials.bilinear.values().copied().collect();

            let side = constraint.rhs - monomials.constant;
            let (lhs, rhs) = match constraint.sense {
                Sense::LessEq => (-f64::INFINITY, side - SIDE_MARGIN),
                Sense::GreaterEq => (side + SIDE_MARGIN, f64::INFINITY),
            };
            scip.add_cons_quadratic(
                lin_vars,
                &mut lin_coefs,
                quad_vars_1,
                quad_vars_2,
                &mut quad_coefs,
                lhs,
                rhs,
                &constraint.name,
            );
        }

        let solved = scip.solve();
        let status = solved.status();

        if let Some(solution) = solved.best_sol() {
            let values: Vec<f64> = vars.iter().map(|var| solution.val(var)).collect();
            if self.model.is_witness(&values, self.tolerance) {
                return Ok((SolverStatus::Optimal, Some(values)));
            }
            warn!(?status, "SCIP returned a point that fails verification");
            return Ok((SolverStatus::Unknown, None));
        }

        let status = match status {
            Status::Infeasible => SolverStatus::Infeasible,
            Status::TimeLimit => SolverStatus::TimeLimit,
            other => {
                warn!(status = ?other, "SCIP stopped without a decision");
                SolverStatus::Unknown
            }
        };
        Ok((status, None))
    }
}

impl NonlinearSolver for ScipSolver {
    fn add_variable(&mut self, name: &str, lower: f64, upper: f64) -> Result<VarId> {
        self.model.add_variable(name, lower, upper)
    }

    fn add_constraint(&mut self, constraint: QuadraticConstraint) -> Result<()> {
        self.model.add_constraint(constraint)
    }

    fn set_time_limit(&mut self, limit: Duration) {
        self.timeout = Some(limit);
    }

    fn solve(&mut self) -> Result<SolverStatus> {
        let start_time = Instant::now();
        info!(
            backend = "scip",
            variables = self.model.variable_count(),
            constraints = self.model.constraint_count(),
            "solving"
        );

        let (status, values) = self.run()?;
        self.status = status;
        self.values = values;

        self.statistics.variable_count = self.model.variable_count();
        self.statistics.constraint_count = self.model.constraint_count();
        self.statistics.solve_time = start_time.elapsed();
        self.statistics.status = status;

        info!(
            status = ?status,
            seconds = self.statistics.solve_time.as_secs_f64(),
            "solver finished"
        );
        Ok(status)
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
