//! Console formatting and document rendering

pub mod display;
pub mod tikz;

pub use display::{Color, ColorOutput, SolutionFormatter};
pub use tikz::TikzRenderer;
