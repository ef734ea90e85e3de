//! Disk Graph Recognition
//!
//! Decides whether a graph is the intersection graph of disks (or of unit
//! disks) in the plane by encoding the question as a system of quadratic
//! constraints and handing it to a continuous feasibility solver. A witness is
//! decoded back into one disk per vertex.
//!
//! Results are only as exact as the solver: a feasible answer is a floating
//! point witness, and non-adjacent disks are kept apart by a small epsilon.
//! Infeasibility proofs of the built-in interval search are approximate too:
//! its interval bounds are computed without outward rounding. The optional
//! `scip` backend hands the system to SCIP instead.
//! Use [`recognition::RealizationValidator`] to see how close a realization
//! comes to tangency.

pub mod config;
pub mod instance;
pub mod nlp;
pub mod recognition;
pub mod utils;

pub use config::Settings;
pub use instance::{Disk, DiskArrangement, Graph};
pub use nlp::RealizationKind;
pub use recognition::{recognize_batch, RecognitionOutcome, RecognitionProblem, SolutionRecord};

use anyhow::Result;

/// Main entry point for recognizing a disk or unit disk graph
pub fn recognize(graph: Graph, kind: RealizationKind, settings: Settings) -> Result<RecognitionOutcome> {
    recognition::recognize(graph, kind, settings)
}
