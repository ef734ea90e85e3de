//! Solution records and recognition outcomes

use crate::instance::{Disk, DiskArrangement, VertexId};
use crate::nlp::RealizationKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Why a recognition problem was left undecided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndecidedReason {
    /// The time budget ran out
    TimeLimit,
    /// The solver exhausted its search budget or hit numerical trouble
    Inconclusive,
}

impl fmt::Display for UndecidedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndecidedReason::TimeLimit => write!(f, "time limit reached"),
            UndecidedReason::Inconclusive => write!(f, "solver inconclusive"),
        }
    }
}

/// Result of a recognition problem.
///
/// `Unknown` means the question was not decided; it says nothing about
/// whether a realization exists.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    Feasible(SolutionRecord),
    Infeasible,
    Unknown(UndecidedReason),
}

impl RecognitionOutcome {
    pub fn is_feasible(&self) -> bool {
        matches!(self, RecognitionOutcome::Feasible(_))
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, RecognitionOutcome::Infeasible)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RecognitionOutcome::Unknown(_))
    }

    pub fn solution(&self) -> Option<&SolutionRecord> {
        match self {
            RecognitionOutcome::Feasible(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for RecognitionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionOutcome::Feasible(record) => {
                write!(f, "{} graph: realization found", record.kind)
            }
            RecognitionOutcome::Infeasible => write!(f, "no realization exists"),
            RecognitionOutcome::Unknown(reason) => write!(f, "undecided ({})", reason),
        }
    }
}

/// A realization decoded from a solver witness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub kind: RealizationKind,
    /// One disk per vertex, ascending by vertex
    pub disks: DiskArrangement,
    pub metadata: SolutionMetadata,
}

/// Metadata about how a realization was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionMetadata {
    pub backend: String,
    pub solve_time_ms: u64,
    /// Worst constraint slack at the witness; absent without constraints
    pub min_slack: Option<f64>,
}

impl SolutionRecord {
    pub fn new(kind: RealizationKind, disks: DiskArrangement, metadata: SolutionMetadata) -> Self {
        Self {
            kind,
            disks,
            metadata,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.disks.len()
    }

    pub fn disk(&self, vertex: VertexId) -> Option<&Disk> {
        self.disks.get(&vertex)
    }

    /// One `(x,y,r) ; ` line per vertex, ascending by vertex
    pub fn to_solution_text(&self) -> String {
        self.disks
            .values()
            .map(|d| format!("({},{},{}) ; \n", d.x, d.y, d.r))
            .collect()
    }

    /// Write the plain-text solution file
    pub fn write_solution_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_solution_text())
            .with_context(|| format!("Failed to write solution file: {}", path.display()))
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Create from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write JSON solution: {}", path.display()))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON solution: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse JSON solution: {}", path.display()))
    }
}

impl fmt::Display for SolutionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} realization of {} vertices ({}, {}ms",
            self.kind,
            self.vertex_count(),
            self.metadata.backend,
            self.metadata.solve_time_ms
        )?;
        if let Some(slack) = self.metadata.min_slack {
            write!(f, ", min slack {:.3e}", slack)?;
        }
        write!(f, ")")
    }
}
