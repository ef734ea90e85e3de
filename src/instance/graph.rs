//! Simple undirected graphs and disks

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Vertex identifier, positive by convention
pub type VertexId = u32;

/// Errors raised while building a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("self-loop on vertex {0} is not allowed")]
    SelfLoop(VertexId),
    #[error("edge ({0}, {1}) references unknown vertex {2}")]
    UnknownVertex(VertexId, VertexId, VertexId),
}

/// Whether an unordered vertex pair is adjacent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairKind {
    Edge,
    NonEdge,
}

/// A disk given by its center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl Disk {
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }

    /// `|c1 - c2|² - (r1 + r2)²`, non-positive iff the disks meet
    pub fn gap(&self, other: &Disk) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let sum = self.r + other.r;
        dx * dx + dy * dy - sum * sum
    }

    /// Disks intersect or are tangent
    pub fn intersects(&self, other: &Disk) -> bool {
        self.gap(other) <= 0.0
    }
}

/// Disk per vertex, in ascending vertex order
pub type DiskArrangement = BTreeMap<VertexId, Disk>;

/// Simple, undirected, loop-free graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    vertices: BTreeSet<VertexId>,
    /// Normalized as `(min, max)`
    edges: BTreeSet<(VertexId, VertexId)>,
}

impl Graph {
    /// Create a graph without vertices
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an edgeless graph on vertices `1..=n`
    pub fn with_vertices(n: usize) -> Self {
        Self {
            vertices: (1..=n as VertexId).collect(),
            edges: BTreeSet::new(),
        }
    }

    /// Create a graph on `1..=n` from a list of edges
    pub fn from_edges(n: usize, edges: &[(VertexId, VertexId)]) -> Result<Self, GraphError> {
        let mut graph = Self::with_vertices(n);
        for &(u, v) in edges {
            graph.add_edge(u, v)?;
        }
        Ok(graph)
    }

    /// Complete graph on `1..=n`
    pub fn complete(n: usize) -> Self {
        let mut graph = Self::with_vertices(n);
        graph.edges = graph.vertices.iter().copied().tuple_combinations().collect();
        graph
    }

    /// Graph on `1..=n` whose edges are the pairs `u < v` accepted by `adjacent`
    pub fn from_adjacency(n: usize, adjacent: impl Fn(VertexId, VertexId) -> bool) -> Self {
        let vertices: BTreeSet<VertexId> = (1..=n as VertexId).collect();
        let edges = vertices
            .iter()
            .copied()
            .tuple_combinations()
            .filter(|&(u, v)| adjacent(u, v))
            .collect();
        Self { vertices, edges }
    }

    /// Cycle through the given vertices in order, closing back to the first
    pub fn cycle(vertices: &[VertexId]) -> Result<Self, GraphError> {
        let mut graph = Self::empty();
        for &v in vertices {
            graph.add_vertex(v);
        }
        if vertices.len() >= 3 {
            for (&u, &v) in vertices.iter().circular_tuple_windows() {
                graph.add_edge(u, v)?;
            }
        } else if let [u, v] = vertices {
            graph.add_edge(*u, *v)?;
        }
        Ok(graph)
    }

    pub fn add_vertex(&mut self, v: VertexId) {
        self.vertices.insert(v);
    }

    /// Add an undirected edge between two existing vertices
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> Result<(), GraphError> {
        if u == v {
            return Err(GraphError::SelfLoop(u));
        }
        for w in [u, v] {
            if !self.vertices.contains(&w) {
                return Err(GraphError::UnknownVertex(u, v, w));
            }
        }
        self.edges.insert(normalize(u, v));
        Ok(())
    }

    pub fn has_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    pub fn has_edge(&self, u: VertexId, v: VertexId) -> bool {
        self.edges.contains(&normalize(u, v))
    }

    /// Vertices in ascending order
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().copied()
    }

    /// Edges as `(min, max)` pairs in ascending order
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.edges.iter().copied()
    }

    /// Every unordered pair of distinct vertices, tagged edge or non-edge
    pub fn pairs(&self) -> impl Iterator<Item = (VertexId, VertexId, PairKind)> + '_ {
        self.vertices
            .iter()
            .copied()
            .tuple_combinations()
            .map(move |(u, v)| {
                let kind = if self.has_edge(u, v) {
                    PairKind::Edge
                } else {
                    PairKind::NonEdge
                };
                (u, v, kind)
            })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn pair_count(&self) -> usize {
        let n = self.vertex_count();
        n * n.saturating_sub(1) / 2
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn degree(&self, v: VertexId) -> usize {
        self.edges.iter().filter(|&&(a, b)| a == v || b == v).count()
    }

    /// Same vertices, adjacency flipped on every pair
    pub fn complement(&self) -> Self {
        let edges = self
            .pairs()
            .filter(|&(_, _, kind)| kind == PairKind::NonEdge)
            .map(|(u, v, _)| (u, v))
            .collect();
        Self {
            vertices: self.vertices.clone(),
            edges,
        }
    }

    /// Disjoint union; the other graph's vertices are shifted past this graph's largest id
    pub fn disjoint_union(&self, other: &Graph) -> Self {
        let offset = self.vertices.iter().next_back().copied().unwrap_or(0);
        let mut union = self.clone();
        union.vertices.extend(other.vertices().map(|v| v + offset));
        union
            .edges
            .extend(other.edges().map(|(u, v)| (u + offset, v + offset)));
        union
    }
}

fn normalize(u: VertexId, v: VertexId) -> (VertexId, VertexId) {
    if u <= v {
        (u, v)
    } else {
        (v, u)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Graph({} vertices, {} edges)",
            self.vertex_count(),
            self.edge_count()
        )
    }
}
