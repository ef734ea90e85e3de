//! Interval branch-and-prune search
//!
//! Boxes of variable domains are classified with interval enclosures of the
//! constraints. A box on which some constraint can never hold is discarded, a
//! box on which every constraint always holds yields its midpoint as a witness,
//! and anything else is bisected along its widest relevant variable. Emptying
//! the search tree proves infeasibility up to floating-point rounding.

use super::constraints::BoxVerdict;
use super::solver::{Deadline, Model, SearchOutcome};
use std::ops::Add;
use tracing::debug;

/// Closed interval `[lo, hi]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn point(value: f64) -> Self {
        Self { lo: value, hi: value }
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn midpoint(&self) -> f64 {
        self.lo + 0.5 * (self.hi - self.lo)
    }

    pub fn scale(self, k: f64) -> Self {
        if k >= 0.0 {
            Self::new(k * self.lo, k * self.hi)
        } else {
            Self::new(k * self.hi, k * self.lo)
        }
    }

    /// `{ v² : v ∈ self }`
    pub fn square(self) -> Self {
        let (a, b) = (self.lo * self.lo, self.hi * self.hi);
        if self.lo >= 0.0 {
            Self::new(a, b)
        } else if self.hi <= 0.0 {
            Self::new(b, a)
        } else {
            Self::new(0.0, a.max(b))
        }
    }

    /// Halves at the midpoint
    pub fn bisect(self) -> (Self, Self) {
        let mid = self.midpoint();
        (Self::new(self.lo, mid), Self::new(mid, self.hi))
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, other: Interval) -> Interval {
        Interval::new(self.lo + other.lo, self.hi + other.hi)
    }
}

/// Depth-first branch-and-prune over the variable box
#[derive(Debug, Clone)]
pub struct IntervalSearch {
    node_limit: usize,
    min_width: f64,
}

impl IntervalSearch {
    pub fn new(node_limit: usize) -> Self {
        Self {
            node_limit,
            min_width: 1e-7,
        }
    }

    /// Search the model's box; returns the outcome and the number of boxes visited
    pub fn search(&self, model: &Model, deadline: Deadline) -> (SearchOutcome, usize) {
        let root: Vec<Interval> = model
            .variables
            .iter()
            .map(|decl| Interval::new(decl.lower, decl.upper))
            .collect();

        let mut stack = vec![root];
        let mut explored = 0;
        let mut unresolved_leaves = 0;

        while let Some(domains) = stack.pop() {
            if explored >= self.node_limit {
                debug!(explored, "interval search hit its node limit");
                return (SearchOutcome::Exhausted, explored);
            }
            if deadline.expired() {
                return (SearchOutcome::TimeLimit, explored);
            }
            explored += 1;

            let mut undecided = Vec::new();
            let mut pruned = false;
            for (idx, constraint) in model.constraints.iter().enumerate() {
                match constraint.verdict(&domains) {
                    BoxVerdict::Violated => {
                        pruned = true;
                        break;
                    }
                    BoxVerdict::Undecided => undecided.push(idx),
                    BoxVerdict::Satisfied => {}
                }
            }
            if pruned {
                continue;
            }
            if undecided.is_empty() {
                let witness = domains.iter().map(Interval::midpoint).collect();
                return (SearchOutcome::Witness(witness), explored);
            }

            match self.branching_variable(model, &domains, &undecided) {
                Some(var) => {
                    let (low, high) = domains[var].bisect();
                    let mut upper_half = domains.clone();
                    upper_half[var] = high;
                    let mut lower_half = domains;
                    lower_half[var] = low;
                    // Explore the half whose midpoint looks more feasible first
                    if midpoint_slack(model, &upper_half) > midpoint_slack(model, &lower_half) {
                        stack.push(lower_half);
                        stack.push(upper_half);
                    } else {
                        stack.push(upper_half);
                        stack.push(lower_half);
                    }
                }
                None => unresolved_leaves += 1,
            }
        }

        if unresolved_leaves > 0 {
            debug!(unresolved_leaves, "interval search left boxes too small to split");
            (SearchOutcome::Exhausted, explored)
        } else {
            (SearchOutcome::Infeasible, explored)
        }
    }

    /// Widest variable occurring in an undecided constraint, if any is still splittable
    fn branching_variable(
        &self,
        model: &Model,
        domains: &[Interval],
        undecided: &[usize],
    ) -> Option<usize> {
        undecided
            .iter()
            .flat_map(|&idx| model.constraints[idx].expr.variables())
            .map(|var| var.index())
            .filter(|&var| domains[var].width() > self.min_width)
            .max_by(|&a, &b| domains[a].width().total_cmp(&domains[b].width()))
    }
}

fn midpoint_slack(model: &Model, domains: &[Interval]) -> f64 {
    let point: Vec<f64> = domains.iter().map(Interval::midpoint).collect();
    model.min_slack(&point)
}
