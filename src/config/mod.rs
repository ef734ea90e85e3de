//! Configuration management for the disk graph recognizer

pub mod settings;

pub use settings::{
    CliOverrides, CoordinateBox, DomainConfig, OutputConfig, RadiusRange, Settings, SolverBackend,
    SolverConfig,
};
