//! Multi-start penalty descent
//!
//! Minimizes the sum of squared violations of the constraints in root form
//! (distances rather than squared distances), measured against a margin, with
//! projected gradient steps and Armijo backtracking. Every iterate is checked
//! against the exact constraints, so the search stops as soon as it crosses
//! into the feasible region. It can find witnesses but never proves their
//! absence.
//!
//! Without a deadline the search gives up after `max_restarts` restarts; with
//! one it keeps restarting until the deadline passes.

use super::solver::{Deadline, Model, SearchOutcome, SolverOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

const ARMIJO: f64 = 1e-4;
const MIN_STEP: f64 = 1e-14;
const MAX_STEP: f64 = 1e6;

/// Root-form margins, cycled across restarts; large margins pull iterates deep
/// into the feasible region, small ones still fit tightly packed instances
const MARGINS: [f64; 3] = [1e-2, 1e-3, 1e-4];

#[derive(Debug, Clone)]
pub struct LocalSearch {
    max_restarts: usize,
    max_iterations: usize,
    seed: u64,
    tolerance: f64,
}

impl LocalSearch {
    pub fn new(options: &SolverOptions) -> Self {
        Self {
            max_restarts: options.max_restarts,
            max_iterations: options.max_iterations,
            seed: options.random_seed,
            tolerance: options.tolerance,
        }
    }

    /// Search for a witness; returns the outcome and the number of restarts used
    pub fn search(&self, model: &Model, deadline: Deadline) -> (SearchOutcome, usize) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut restart = 0;

        while restart < self.max_restarts || deadline.is_bounded() {
            if deadline.expired() {
                return (SearchOutcome::TimeLimit, restart);
            }

            let start: Vec<f64> = model
                .variables
                .iter()
                .map(|decl| {
                    if decl.lower < decl.upper {
                        rng.gen_range(decl.lower..=decl.upper)
                    } else {
                        decl.lower
                    }
                })
                .collect();

            let margin = MARGINS[restart % MARGINS.len()];
            restart += 1;
            match self.descend(model, start, margin, deadline) {
                Descent::Found(values) => {
                    debug!(restart, "local search found a witness");
                    return (SearchOutcome::Witness(values), restart);
                }
                Descent::OutOfTime => return (SearchOutcome::TimeLimit, restart),
                Descent::Stalled(penalty) => {
                    trace!(restart, margin, penalty, "local search restart stalled");
                }
            }
        }

        (SearchOutcome::Exhausted, restart)
    }

    fn descend(&self, model: &Model, mut point: Vec<f64>, margin: f64, deadline: Deadline) -> Descent {
        let mut step = 1.0;
        let mut penalty = total_penalty(model, &point, margin);
        let mut gradient = vec![0.0; point.len()];

        for iteration in 0..self.max_iterations {
            if model.is_witness(&point, self.tolerance) {
                return Descent::Found(point);
            }
            if iteration % 64 == 0 && deadline.expired() {
                return Descent::OutOfTime;
            }

            penalty_gradient(model, &point, margin, &mut gradient);

            // Backtrack until the projected step decreases the penalty enough
            loop {
                let candidate: Vec<f64> = point
                    .iter()
                    .zip(&gradient)
                    .zip(&model.variables)
                    .map(|((&p, &g), decl)| (p - step * g).clamp(decl.lower, decl.upper))
                    .collect();
                let decrease: f64 = point
                    .iter()
                    .zip(&candidate)
                    .zip(&gradient)
                    .map(|((&p, &c), &g)| g * (p - c))
                    .sum();
                let candidate_penalty = total_penalty(model, &candidate, margin);

                if decrease > 0.0 && candidate_penalty <= penalty - ARMIJO * decrease {
                    point = candidate;
                    penalty = candidate_penalty;
                    step = (step * 2.0).min(MAX_STEP);
                    break;
                }

                step *= 0.5;
                if step < MIN_STEP {
                    return Descent::Stalled(penalty);
                }
            }
        }

        if model.is_witness(&point, self.tolerance) {
            Descent::Found(point)
        } else {
            Descent::Stalled(penalty)
        }
    }
}

fn total_penalty(model: &Model, point: &[f64], margin: f64) -> f64 {
    model
        .constraints
        .iter()
        .map(|c| {
            let v = (margin - c.root_slack(point)).max(0.0);
            v * v
        })
        .sum()
}

fn penalty_gradient(model: &Model, point: &[f64], margin: f64, gradient: &mut [f64]) {
    gradient.iter_mut().for_each(|g| *g = 0.0);
    for constraint in &model.constraints {
        let v = margin - constraint.root_slack(point);
        if v > 0.0 {
            constraint.accumulate_root_gradient(point, -2.0 * v, gradient);
        }
    }
}

enum Descent {
    Found(Vec<f64>),
    OutOfTime,
    Stalled(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::constraints::{LinearExpr, QuadraticConstraint, QuadraticExpr, Sense};
    use std::time::Duration;

    fn gap_model(upper: f64, min_gap_squared: f64) -> Model {
        let mut model = Model::new();
        let a = model.add_variable("a", 0.0, upper).unwrap();
        let b = model.add_variable("b", 0.0, upper).unwrap();
        let expr = QuadraticExpr::new().add_square(1.0, LinearExpr::difference(a, b));
        model
            .add_constraint(QuadraticConstraint::new(
                "gap",
                expr,
                Sense::GreaterEq,
                min_gap_squared,
            ))
            .unwrap();
        model
    }

    #[test]
    fn test_finds_witness() {
        let model = gap_model(4.0, 4.0);
        let search = LocalSearch::new(&SolverOptions::default());
        let (outcome, restarts) = search.search(&model, Deadline::none());

        let SearchOutcome::Witness(values) = outcome else {
            panic!("expected a witness, got {:?}", outcome);
        };
        assert!(model.is_witness(&values, 1e-9));
        assert!(restarts >= 1);
    }

    #[test]
    fn test_never_claims_infeasibility() {
        let model = gap_model(1.0, 4.0);
        let options = SolverOptions {
            max_restarts: 5,
            max_iterations: 100,
            ..Default::default()
        };
        let (outcome, restarts) = LocalSearch::new(&options).search(&model, Deadline::none());

        assert_eq!(outcome, SearchOutcome::Exhausted);
        assert_eq!(restarts, 5);
    }

    #[test]
    fn test_respects_deadline() {
        let model = gap_model(1.0, 4.0);
        let options = SolverOptions {
            max_restarts: usize::MAX,
            ..Default::default()
        };
        let deadline = Deadline::after(Some(Duration::from_millis(50)));
        let (outcome, _) = LocalSearch::new(&options).search(&model, deadline);

        assert_eq!(outcome, SearchOutcome::TimeLimit);
    }

    #[test]
    fn test_deadline_outlasts_restart_cap() {
        let model = gap_model(1.0, 4.0);
        let options = SolverOptions {
            max_restarts: 1,
            max_iterations: 50,
            ..Default::default()
        };
        let deadline = Deadline::after(Some(Duration::from_millis(100)));
        let (outcome, restarts) = LocalSearch::new(&options).search(&model, deadline);

        assert_eq!(outcome, SearchOutcome::TimeLimit);
        assert!(restarts > 1, "only {} restart(s)", restarts);
    }

    #[test]
    fn test_separates_coincident_start() {
        // Both points start at the lower bound, where squared gaps have no slope
        let model = gap_model(3.0, 4.0);
        let search = LocalSearch::new(&SolverOptions::default());
        let descent = search.descend(&model, vec![0.0, 0.0], MARGINS[0], Deadline::none());

        let Descent::Found(values) = descent else {
            panic!("descent stalled at coincident points");
        };
        assert!((values[0] - values[1]).abs() >= 2.0);
    }

    #[test]
    fn test_same_seed_same_witness() {
        let model = gap_model(4.0, 1.0);
        let search = LocalSearch::new(&SolverOptions::default());

        let first = search.search(&model, Deadline::none());
        let second = search.search(&model, Deadline::none());
        assert_eq!(first, second);
    }
}
