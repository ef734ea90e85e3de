//! Variable management for the disk encoding

use crate::instance::VertexId;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Solver-side handle of a continuous variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Geometric role of a per-vertex variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coordinate {
    X,
    Y,
    R,
}

impl Coordinate {
    pub fn prefix(self) -> &'static str {
        match self {
            Coordinate::X => "x",
            Coordinate::Y => "y",
            Coordinate::R => "r",
        }
    }

    /// Variable name for a vertex, e.g. `x3`
    pub fn variable_name(self, vertex: VertexId) -> String {
        format!("{}{}", self.prefix(), vertex)
    }
}

/// Declaration of a continuous variable with inclusive bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }
}

/// Maps `(vertex, coordinate)` to the solver handle for one constraint system
#[derive(Debug, Default)]
pub struct VariableManager {
    handles: HashMap<(VertexId, Coordinate), VarId>,
}

impl VariableManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the handle of a vertex coordinate
    pub fn insert(&mut self, vertex: VertexId, coordinate: Coordinate, handle: VarId) -> Result<()> {
        if self.handles.insert((vertex, coordinate), handle).is_some() {
            anyhow::bail!(
                "Variable {} declared twice",
                coordinate.variable_name(vertex)
            );
        }
        Ok(())
    }

    pub fn get(&self, vertex: VertexId, coordinate: Coordinate) -> Option<VarId> {
        self.handles.get(&(vertex, coordinate)).copied()
    }

    /// Look up a handle that must exist
    pub fn handle(&self, vertex: VertexId, coordinate: Coordinate) -> Result<VarId> {
        self.get(vertex, coordinate).ok_or_else(|| {
            anyhow::anyhow!(
                "No variable {} in this constraint system",
                coordinate.variable_name(vertex)
            )
        })
    }

    pub fn variable_count(&self) -> usize {
        self.handles.len()
    }
}
