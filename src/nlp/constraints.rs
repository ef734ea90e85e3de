//! Quadratic constraints for the disk encoding

use super::interval::Interval;
use super::VarId;
use crate::instance::{PairKind, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Square roots below this are treated as zero when differentiating
const ROOT_FLOOR: f64 = 1e-12;

/// `constant + Σ coeff·var`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    /// `a - b`
    pub fn difference(a: VarId, b: VarId) -> Self {
        Self {
            terms: vec![(a, 1.0), (b, -1.0)],
            constant: 0.0,
        }
    }

    /// `a + b`
    pub fn sum(a: VarId, b: VarId) -> Self {
        Self {
            terms: vec![(a, 1.0), (b, 1.0)],
            constant: 0.0,
        }
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, &(var, coeff)| acc + coeff * values[var.index()])
    }

    pub fn enclose(&self, domains: &[Interval]) -> Interval {
        self.terms
            .iter()
            .fold(Interval::point(self.constant), |acc, &(var, coeff)| {
                acc + domains[var.index()].scale(coeff)
            })
    }

    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.terms.iter().map(|&(var, _)| var)
    }

    fn map_variables(&self, f: &impl Fn(VarId) -> VarId) -> Self {
        Self {
            terms: self.terms.iter().map(|&(var, c)| (f(var), c)).collect(),
            constant: self.constant,
        }
    }
}

fn has_sign(weight: f64, positive: bool) -> bool {
    if positive {
        weight > 0.0
    } else {
        weight < 0.0
    }
}

/// `constant + Σ aᵢ·xᵢ + Σ bᵢⱼ·xᵢ·xⱼ` with each product keyed `(i, j)`, `i ≤ j`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Monomials {
    pub constant: f64,
    pub linear: BTreeMap<VarId, f64>,
    pub bilinear: BTreeMap<(VarId, VarId), f64>,
}

impl Monomials {
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let linear: f64 = self
            .linear
            .iter()
            .map(|(var, c)| c * values[var.index()])
            .sum();
        let bilinear: f64 = self
            .bilinear
            .iter()
            .map(|((a, b), c)| c * values[a.index()] * values[b.index()])
            .sum();
        self.constant + linear + bilinear
    }
}

/// `weight · base²`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareTerm {
    pub weight: f64,
    pub base: LinearExpr,
}

/// Quadratic polynomial written as a weighted sum of squared linear forms plus a linear part.
///
/// Keeping the squares factored lets interval enclosures stay tight: each
/// squared form is enclosed once instead of as independent monomials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadraticExpr {
    pub squares: Vec<SquareTerm>,
    pub linear: LinearExpr,
}

impl QuadraticExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight · base²`
    pub fn add_square(mut self, weight: f64, base: LinearExpr) -> Self {
        self.squares.push(SquareTerm { weight, base });
        self
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.squares.iter().fold(self.linear.evaluate(values), |acc, sq| {
            let b = sq.base.evaluate(values);
            acc + sq.weight * b * b
        })
    }

    /// Add `scale · ∇expr(values)` into `gradient`
    pub fn accumulate_gradient(&self, values: &[f64], scale: f64, gradient: &mut [f64]) {
        for sq in &self.squares {
            let factor = 2.0 * sq.weight * sq.base.evaluate(values) * scale;
            for &(var, coeff) in &sq.base.terms {
                gradient[var.index()] += factor * coeff;
            }
        }
        for &(var, coeff) in &self.linear.terms {
            gradient[var.index()] += scale * coeff;
        }
    }

    /// `Σ |weight|·base²` over the squares whose weight has the given sign
    fn signed_squares(&self, values: &[f64], positive: bool) -> f64 {
        self.squares
            .iter()
            .filter(|sq| has_sign(sq.weight, positive))
            .map(|sq| {
                let b = sq.base.evaluate(values);
                sq.weight.abs() * b * b
            })
            .sum()
    }

    fn accumulate_signed_gradient(
        &self,
        values: &[f64],
        positive: bool,
        scale: f64,
        gradient: &mut [f64],
    ) {
        for sq in self.squares.iter().filter(|sq| has_sign(sq.weight, positive)) {
            let factor = 2.0 * sq.weight.abs() * sq.base.evaluate(values) * scale;
            for &(var, coeff) in &sq.base.terms {
                gradient[var.index()] += factor * coeff;
            }
        }
    }

    /// Expand into monomials
    pub fn monomials(&self) -> Monomials {
        let mut result = Monomials {
            constant: self.linear.constant,
            ..Default::default()
        };
        for &(var, coeff) in &self.linear.terms {
            *result.linear.entry(var).or_insert(0.0) += coeff;
        }

        for sq in &self.squares {
            let (w, k) = (sq.weight, sq.base.constant);
            result.constant += w * k * k;
            for &(a, ca) in &sq.base.terms {
                *result.linear.entry(a).or_insert(0.0) += 2.0 * w * k * ca;
                for &(b, cb) in &sq.base.terms {
                    let key = if a <= b { (a, b) } else { (b, a) };
                    *result.bilinear.entry(key).or_insert(0.0) += w * ca * cb;
                }
            }
        }

        result.linear.retain(|_, c| *c != 0.0);
        result.bilinear.retain(|_, c| *c != 0.0);
        result
    }

    /// Interval enclosure of the expression over a box
    pub fn enclose(&self, domains: &[Interval]) -> Interval {
        self.squares
            .iter()
            .fold(self.linear.enclose(domains), |acc, sq| {
                acc + sq.base.enclose(domains).square().scale(sq.weight)
            })
    }

    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.squares
            .iter()
            .flat_map(|sq| sq.base.variables())
            .chain(self.linear.variables())
    }

    fn map_variables(&self, f: &impl Fn(VarId) -> VarId) -> Self {
        Self {
            squares: self
                .squares
                .iter()
                .map(|sq| SquareTerm {
                    weight: sq.weight,
                    base: sq.base.map_variables(f),
                })
                .collect(),
            linear: self.linear.map_variables(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    LessEq,
    GreaterEq,
}

/// Vertex pair a constraint was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintOrigin {
    pub u: VertexId,
    pub v: VertexId,
    pub kind: PairKind,
}

/// Truth of a constraint over a whole box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxVerdict {
    Satisfied,
    Violated,
    Undecided,
}

/// `expr (≤ | ≥) rhs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticConstraint {
    pub name: String,
    pub expr: QuadraticExpr,
    pub sense: Sense,
    pub rhs: f64,
    pub origin: Option<ConstraintOrigin>,
}

impl QuadraticConstraint {
    pub fn new(name: impl Into<String>, expr: QuadraticExpr, sense: Sense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            sense,
            rhs,
            origin: None,
        }
    }

    pub fn with_origin(mut self, u: VertexId, v: VertexId, kind: PairKind) -> Self {
        self.origin = Some(ConstraintOrigin { u, v, kind });
        self
    }

    /// Signed distance from the bound, non-negative when satisfied
    pub fn slack(&self, values: &[f64]) -> f64 {
        let value = self.expr.evaluate(values);
        match self.sense {
            Sense::LessEq => self.rhs - value,
            Sense::GreaterEq => value - self.rhs,
        }
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.slack(values) >= -tolerance
    }

    /// Positive squares `P` and the bound they are compared against, `Q = N + rhs - linear`
    fn root_sides(&self, values: &[f64]) -> (f64, f64) {
        let p = self.expr.signed_squares(values, true);
        let q = self.expr.signed_squares(values, false) + self.rhs - self.expr.linear.evaluate(values);
        (p, q)
    }

    /// Slack in root form, `√Q - √P` for `≤` and `√P - √Q` for `≥`, with `√Q`
    /// signed like `Q`.
    ///
    /// Has the sign of [`slack`](Self::slack) but scales like a distance, so its
    /// gradient stays informative where squared distances flatten out.
    pub fn root_slack(&self, values: &[f64]) -> f64 {
        let (p, q) = self.root_sides(values);
        let gap = signed_root(q) - p.sqrt();
        match self.sense {
            Sense::LessEq => gap,
            Sense::GreaterEq => -gap,
        }
    }

    /// Add `scale · ∇root_slack(values)` into `gradient`
    pub fn accumulate_root_gradient(&self, values: &[f64], scale: f64, gradient: &mut [f64]) {
        let scale = match self.sense {
            Sense::LessEq => scale,
            Sense::GreaterEq => -scale,
        };
        let (p, q) = self.root_sides(values);

        let root_p = p.sqrt();
        if root_p > ROOT_FLOOR {
            self.expr
                .accumulate_signed_gradient(values, true, -scale / (2.0 * root_p), gradient);
        } else if let Some(sq) = self.expr.squares.iter().find(|sq| sq.weight > 0.0) {
            // √P is a norm; at its kink any direction of one square is a subgradient
            let factor = -scale * sq.weight.sqrt();
            for &(var, coeff) in &sq.base.terms {
                gradient[var.index()] += factor * coeff;
            }
        }

        let q_scale = scale / (2.0 * q.abs().sqrt().max(ROOT_FLOOR));
        self.expr
            .accumulate_signed_gradient(values, false, q_scale, gradient);
        for &(var, coeff) in &self.expr.linear.terms {
            gradient[var.index()] -= q_scale * coeff;
        }
    }

    /// Classify the constraint over a box of variable domains
    pub fn verdict(&self, domains: &[Interval]) -> BoxVerdict {
        let range = self.expr.enclose(domains);
        let (always, never) = match self.sense {
            Sense::LessEq => (range.hi <= self.rhs, range.lo > self.rhs),
            Sense::GreaterEq => (range.lo >= self.rhs, range.hi < self.rhs),
        };
        if never {
            BoxVerdict::Violated
        } else if always {
            BoxVerdict::Satisfied
        } else {
            BoxVerdict::Undecided
        }
    }

    /// Same constraint over renamed variables
    pub fn map_variables(&self, f: impl Fn(VarId) -> VarId) -> Self {
        Self {
            name: self.name.clone(),
            expr: self.expr.map_variables(&f),
            sense: self.sense,
            rhs: self.rhs,
            origin: self.origin,
        }
    }
}

impl fmt::Display for QuadraticConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.sense {
            Sense::LessEq => "<=",
            Sense::GreaterEq => ">=",
        };
        write!(
            f,
            "{}: {} squared terms {} {}",
            self.name,
            self.expr.squares.len(),
            op,
            self.rhs
        )
    }
}

/// Variable handles of one vertex
#[derive(Debug, Clone, Copy)]
pub struct VertexVars {
    pub x: VarId,
    pub y: VarId,
}

/// Builds the pair constraints of the disk encoding
#[derive(Debug, Clone, Copy)]
pub struct ConstraintGenerator {
    epsilon: f64,
    unit_radius: f64,
}

impl ConstraintGenerator {
    pub fn new(epsilon: f64, unit_radius: f64) -> Self {
        Self {
            epsilon,
            unit_radius,
        }
    }

    /// `(xu-xv)² + (yu-yv)² - (ru+rv)²` compared to `0` (edge) or `ε` (non-edge)
    pub fn general_pair(
        &self,
        (u, a): (VertexId, VertexVars),
        (v, b): (VertexId, VertexVars),
        kind: PairKind,
        (ru, rv): (VarId, VarId),
    ) -> QuadraticConstraint {
        let expr = center_distance(a, b).add_square(-1.0, LinearExpr::sum(ru, rv));
        self.bound(u, v, kind, expr, 0.0)
    }

    /// `(xu-xv)² + (yu-yv)²` compared to `(2ρ)²` (edge) or `(2ρ)² + ε` (non-edge)
    pub fn unit_pair(
        &self,
        (u, a): (VertexId, VertexVars),
        (v, b): (VertexId, VertexVars),
        kind: PairKind,
    ) -> QuadraticConstraint {
        let diameter = 2.0 * self.unit_radius;
        self.bound(u, v, kind, center_distance(a, b), diameter * diameter)
    }

    fn bound(
        &self,
        u: VertexId,
        v: VertexId,
        kind: PairKind,
        expr: QuadraticExpr,
        threshold: f64,
    ) -> QuadraticConstraint {
        let constraint = match kind {
            PairKind::Edge => {
                QuadraticConstraint::new(format!("edge_{}_{}", u, v), expr, Sense::LessEq, threshold)
            }
            PairKind::NonEdge => QuadraticConstraint::new(
                format!("nonedge_{}_{}", u, v),
                expr,
                Sense::GreaterEq,
                threshold + self.epsilon,
            ),
        };
        constraint.with_origin(u, v, kind)
    }
}

fn signed_root(value: f64) -> f64 {
    value.signum() * value.abs().sqrt()
}

fn center_distance(a: VertexVars, b: VertexVars) -> QuadraticExpr {
    QuadraticExpr::new()
        .add_square(1.0, LinearExpr::difference(a.x, b.x))
        .add_square(1.0, LinearExpr::difference(a.y, b.y))
}
