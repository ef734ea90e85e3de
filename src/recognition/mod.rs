//! Recognition problems, their outcomes and realization checks

pub mod problem;
pub mod solution;
pub mod validator;

pub use problem::{recognize, recognize_batch, RecognitionProblem};
pub use solution::{RecognitionOutcome, SolutionMetadata, SolutionRecord, UndecidedReason};
pub use validator::{PairMismatch, RealizationValidator, ValidationReport};
