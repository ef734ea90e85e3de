//! Encoder from recognition problems to quadratic constraint systems

use super::constraints::{ConstraintGenerator, QuadraticConstraint, VertexVars};
use super::solver::NonlinearSolver;
use super::variables::{Coordinate, VarId, VariableDecl, VariableManager};
use crate::config::DomainConfig;
use crate::instance::{Disk, DiskArrangement, Graph, PairKind, VertexId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Which family of intersection graphs to recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealizationKind {
    /// Disks of arbitrary radius
    General,
    /// Disks sharing one fixed radius
    Unit,
}

impl fmt::Display for RealizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealizationKind::General => write!(f, "disk"),
            RealizationKind::Unit => write!(f, "unit disk"),
        }
    }
}

/// Continuous feasibility problem for one graph.
///
/// Constraints refer to variables by their position in `variables`; `submit`
/// renames them to whatever handles the receiving solver hands out.
#[derive(Debug, Clone)]
pub struct ConstraintSystem {
    pub kind: RealizationKind,
    pub variables: Vec<VariableDecl>,
    /// Vertex and coordinate of each entry in `variables`
    pub layout: Vec<(VertexId, Coordinate)>,
    pub constraints: Vec<QuadraticConstraint>,
    pub unit_radius: f64,
}

impl ConstraintSystem {
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.constraints.is_empty()
    }

    fn count_kind(&self, kind: PairKind) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.origin.is_some_and(|o| o.kind == kind))
            .count()
    }

    /// Vertices in the order their variables were declared
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.layout
            .iter()
            .filter(|(_, coordinate)| *coordinate == Coordinate::X)
            .map(|&(vertex, _)| vertex)
    }

    /// Declare every variable and constraint on a solver
    pub fn submit(&self, solver: &mut dyn NonlinearSolver) -> Result<VariableManager> {
        let mut manager = VariableManager::new();
        let mut handles = Vec::with_capacity(self.variables.len());

        for (decl, &(vertex, coordinate)) in self.variables.iter().zip(&self.layout) {
            let handle = solver
                .add_variable(&decl.name, decl.lower, decl.upper)
                .with_context(|| format!("Failed to declare variable {}", decl.name))?;
            manager.insert(vertex, coordinate, handle)?;
            handles.push(handle);
        }

        for constraint in &self.constraints {
            let renamed = constraint.map_variables(|local| handles[local.index()]);
            solver
                .add_constraint(renamed)
                .with_context(|| format!("Failed to add constraint {}", constraint.name))?;
        }

        Ok(manager)
    }

    /// Values of this system's variables for a given arrangement, if it covers every vertex
    pub fn assignment(&self, arrangement: &DiskArrangement) -> Option<Vec<f64>> {
        self.layout
            .iter()
            .map(|&(vertex, coordinate)| {
                arrangement.get(&vertex).map(|disk| match coordinate {
                    Coordinate::X => disk.x,
                    Coordinate::Y => disk.y,
                    Coordinate::R => disk.r,
                })
            })
            .collect()
    }

    /// Smallest slack over all constraints at a point given in declaration order
    pub fn min_slack(&self, values: &[f64]) -> f64 {
        self.constraints
            .iter()
            .map(|c| c.slack(values))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn statistics(&self) -> EncodingStatistics {
        EncodingStatistics {
            kind: self.kind,
            vertex_count: self.vertices().count(),
            total_variables: self.variable_count(),
            edge_constraints: self.count_kind(PairKind::Edge),
            non_edge_constraints: self.count_kind(PairKind::NonEdge),
        }
    }
}

/// Builds constraint systems and decodes solver witnesses into disks
#[derive(Debug, Clone)]
pub struct DiskEncoder {
    domain: DomainConfig,
    generator: ConstraintGenerator,
}

impl DiskEncoder {
    pub fn new(domain: DomainConfig) -> Self {
        let generator = ConstraintGenerator::new(domain.epsilon, domain.unit_radius);
        Self { domain, generator }
    }

    pub fn domain(&self) -> &DomainConfig {
        &self.domain
    }

    /// Encode a graph; exactly one constraint per unordered vertex pair
    pub fn encode(&self, graph: &Graph, kind: RealizationKind) -> ConstraintSystem {
        let mut variables = Vec::new();
        let mut layout = Vec::new();
        let mut declare = |vertex: VertexId, coordinate: Coordinate, lower: f64, upper: f64| {
            variables.push(VariableDecl::new(
                coordinate.variable_name(vertex),
                lower,
                upper,
            ));
            layout.push((vertex, coordinate));
            VarId(variables.len() - 1)
        };

        let centers = match kind {
            RealizationKind::General => &self.domain.general,
            RealizationKind::Unit => &self.domain.unit,
        };

        let mut vertex_vars = BTreeMap::new();
        for vertex in graph.vertices() {
            let x = declare(vertex, Coordinate::X, centers.x_min, centers.x_max);
            let y = declare(vertex, Coordinate::Y, centers.y_min, centers.y_max);
            let r = match kind {
                RealizationKind::General => Some(declare(
                    vertex,
                    Coordinate::R,
                    self.domain.radius.min,
                    self.domain.radius.max,
                )),
                RealizationKind::Unit => None,
            };
            vertex_vars.insert(vertex, (VertexVars { x, y }, r));
        }

        let constraints: Vec<_> = graph
            .pairs()
            .map(|(u, v, pair_kind)| {
                let (a, ru) = vertex_vars[&u];
                let (b, rv) = vertex_vars[&v];
                match (ru, rv) {
                    (Some(ru), Some(rv)) => {
                        self.generator.general_pair((u, a), (v, b), pair_kind, (ru, rv))
                    }
                    _ => self.generator.unit_pair((u, a), (v, b), pair_kind),
                }
            })
            .collect();

        debug!(
            %kind,
            variables = variables.len(),
            constraints = constraints.len(),
            "encoded {}",
            graph
        );

        ConstraintSystem {
            kind,
            variables,
            layout,
            constraints,
            unit_radius: self.domain.unit_radius,
        }
    }

    /// Factor mapping the unit domain into the general one
    pub fn unit_embedding_scale(&self) -> f64 {
        let (from, to) = (&self.domain.unit, &self.domain.general);
        (to.width() / from.width())
            .min(to.height() / from.height())
            .min(self.domain.radius.max / self.domain.unit_radius)
    }

    /// Map a unit realization into the general domain.
    ///
    /// Centers are scaled by `s = unit_embedding_scale()` about the lower
    /// corners of both boxes and every radius becomes `s·ρ`. Edge slacks only
    /// scale by `s²`, but a non-edge gap `d² - 4ρ²` shrinks the same way and
    /// must still reach `ε`, so unit gaps below `ε / s²` do not survive.
    /// Returns `None` in that case, when a center lies outside the unit box,
    /// or when `s·ρ` leaves the radius range.
    pub fn embed_unit(&self, graph: &Graph, unit: &DiskArrangement) -> Option<DiskArrangement> {
        let (from, to) = (&self.domain.unit, &self.domain.general);
        let scale = self.unit_embedding_scale();

        let embedded = unit
            .iter()
            .map(|(&vertex, disk)| {
                let inside = from.x_min <= disk.x
                    && disk.x <= from.x_max
                    && from.y_min <= disk.y
                    && disk.y <= from.y_max;
                inside.then(|| {
                    let x = (to.x_min + scale * (disk.x - from.x_min)).clamp(to.x_min, to.x_max);
                    let y = (to.y_min + scale * (disk.y - from.y_min)).clamp(to.y_min, to.y_max);
                    (vertex, Disk::new(x, y, scale * disk.r))
                })
            })
            .collect::<Option<DiskArrangement>>()?;

        let system = self.encode(graph, RealizationKind::General);
        let values = system.assignment(&embedded)?;
        let in_bounds = system
            .variables
            .iter()
            .zip(&values)
            .all(|(decl, &value)| decl.lower <= value && value <= decl.upper);
        (in_bounds && system.min_slack(&values) >= 0.0).then_some(embedded)
    }

    /// Read a solver's witness back into one disk per vertex
    pub fn decode(
        &self,
        system: &ConstraintSystem,
        handles: &VariableManager,
        solver: &dyn NonlinearSolver,
    ) -> Result<DiskArrangement> {
        let read = |vertex: VertexId, coordinate: Coordinate| -> Result<f64> {
            let handle = handles.handle(vertex, coordinate)?;
            solver.value(handle).with_context(|| {
                format!(
                    "Solver has no value for {}",
                    coordinate.variable_name(vertex)
                )
            })
        };

        let mut arrangement = DiskArrangement::new();
        for vertex in system.vertices() {
            let x = read(vertex, Coordinate::X)?;
            let y = read(vertex, Coordinate::Y)?;
            let r = match system.kind {
                RealizationKind::General => read(vertex, Coordinate::R)?,
                RealizationKind::Unit => system.unit_radius,
            };
            arrangement.insert(vertex, Disk::new(x, y, r));
        }
        Ok(arrangement)
    }
}

/// Size of an encoded constraint system
#[derive(Debug, Clone)]
pub struct EncodingStatistics {
    pub kind: RealizationKind,
    pub vertex_count: usize,
    pub total_variables: usize,
    pub edge_constraints: usize,
    pub non_edge_constraints: usize,
}

impl EncodingStatistics {
    pub fn total_constraints(&self) -> usize {
        self.edge_constraints + self.non_edge_constraints
    }
}

impl fmt::Display for EncodingStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Encoding Statistics ({} graph):", self.kind)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Variables: {}", self.total_variables)?;
        writeln!(f, "  Edge constraints: {}", self.edge_constraints)?;
        writeln!(f, "  Non-edge constraints: {}", self.non_edge_constraints)?;
        writeln!(f, "  Total constraints: {}", self.total_constraints())?;
        Ok(())
    }
}
