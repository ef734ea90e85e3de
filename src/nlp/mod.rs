//! Continuous constraint encoding and the built-in feasibility solvers

pub mod constraints;
pub mod encoder;
pub mod interval;
pub mod local_search;
#[cfg(feature = "scip")]
pub mod scip_solver;
pub mod solver;
pub mod solver_factory;
pub mod variables;

pub use constraints::{ConstraintGenerator, QuadraticConstraint, QuadraticExpr, Sense};
pub use encoder::{ConstraintSystem, DiskEncoder, EncodingStatistics, RealizationKind};
pub use solver::{NonlinearSolver, SolverOptions, SolverStatistics, SolverStatus};
pub use solver_factory::{BuiltInSolver, SearchStrategy, UnifiedSolver};
pub use variables::{Coordinate, VarId, VariableManager};
