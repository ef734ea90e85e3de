//! Configuration settings for the disk graph recognizer

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub domain: DomainConfig,
    pub solver: SolverConfig,
    pub output: OutputConfig,
}

/// Variable domains and tolerances used when encoding a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Center box for general disk realizations
    pub general: CoordinateBox,
    /// Radius range for general disk realizations
    pub radius: RadiusRange,
    /// Center box for unit disk realizations
    pub unit: CoordinateBox,
    /// Common radius of every disk in a unit realization
    pub unit_radius: f64,
    /// Minimum separation slack required between non-adjacent disks
    pub epsilon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Wall-clock budget, 0 disables the limit
    pub timeout_seconds: u64,
    /// Random restarts of the local search backend; a timeout replaces this cap
    pub max_restarts: usize,
    /// Descent iterations per restart
    pub max_iterations: usize,
    /// Box budget of the interval search; the interval backend ignores it under a timeout
    pub node_limit: usize,
    pub seed: u64,
    /// Absolute constraint violation accepted in a witness; 0 demands exact satisfaction
    pub tolerance: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    Hybrid,
    LocalSearch,
    Interval,
    /// SCIP spatial branch-and-bound, needs the `scip` feature
    Scip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub solution_file: PathBuf,
    pub json_file: Option<PathBuf>,
    pub render_scale: f64,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            general: CoordinateBox {
                x_min: 1.0,
                x_max: 2.0,
                y_min: 1.0,
                y_max: 2.0,
            },
            radius: RadiusRange { min: 0.0, max: 1.5 },
            unit: CoordinateBox {
                x_min: 1.0,
                x_max: 10.0,
                y_min: 1.0,
                y_max: 10.0,
            },
            unit_radius: 1.0,
            epsilon: 0.00001,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Hybrid,
            timeout_seconds: 0,
            max_restarts: 200,
            max_iterations: 2000,
            node_limit: 20_000,
            seed: 42,
            tolerance: 0.0,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            domain: DomainConfig::default(),
            solver: SolverConfig::default(),
            output: OutputConfig {
                solution_file: PathBuf::from("solution.txt"),
                json_file: None,
                render_scale: 8.0,
            },
        }
    }
}

impl CoordinateBox {
    pub fn is_empty(&self) -> bool {
        !(self.x_min <= self.x_max && self.y_min <= self.y_max)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

impl DomainConfig {
    /// Validate the domain bounds
    pub fn validate(&self) -> Result<()> {
        if self.general.is_empty() {
            anyhow::bail!("General coordinate box is empty: {:?}", self.general);
        }
        if self.unit.is_empty() {
            anyhow::bail!("Unit coordinate box is empty: {:?}", self.unit);
        }
        if self.radius.min < 0.0 || self.radius.min > self.radius.max {
            anyhow::bail!(
                "Radius range [{}, {}] must be non-empty and non-negative",
                self.radius.min,
                self.radius.max
            );
        }
        if !(self.unit_radius > 0.0) {
            anyhow::bail!("Unit radius must be positive, got {}", self.unit_radius);
        }
        if !(self.epsilon > 0.0) {
            anyhow::bail!("Separation epsilon must be positive, got {}", self.epsilon);
        }
        Ok(())
    }
}

impl SolverConfig {
    /// Time budget, if any
    pub fn time_limit(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        self.domain.validate()?;

        if self.solver.max_restarts == 0 {
            anyhow::bail!("Maximum restarts must be positive");
        }

        if self.solver.max_iterations == 0 {
            anyhow::bail!("Maximum iterations must be positive");
        }

        if !(self.solver.tolerance >= 0.0) {
            anyhow::bail!("Solver tolerance must be non-negative");
        }

        if !(self.output.render_scale > 0.0) {
            anyhow::bail!("Render scale must be positive");
        }

        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(timeout) = cli_overrides.timeout_seconds {
            self.solver.timeout_seconds = timeout;
        }
        if let Some(backend) = cli_overrides.backend {
            self.solver.backend = backend;
        }
        if let Some(seed) = cli_overrides.seed {
            self.solver.seed = seed;
        }
        if let Some(epsilon) = cli_overrides.epsilon {
            self.domain.epsilon = epsilon;
        }
        if let Some(ref solution_file) = cli_overrides.solution_file {
            self.output.solution_file = solution_file.clone();
        }
        if let Some(ref json_file) = cli_overrides.json_file {
            self.output.json_file = Some(json_file.clone());
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub timeout_seconds: Option<u64>,
    pub backend: Option<SolverBackend>,
    pub seed: Option<u64>,
    pub epsilon: Option<f64>,
    pub solution_file: Option<PathBuf>,
    pub json_file: Option<PathBuf>,
}
