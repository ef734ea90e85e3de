//! Main CLI application for disk graph recognition

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use disk_graph_recognition::{
    config::{CliOverrides, Settings, SolverBackend},
    instance::{
        create_example_graphs, io::parse_disks_from_string, load_graph_from_file,
        random_disk_graph_with_rng, save_disks_to_file, save_graph_to_file, DiskArrangement,
    },
    nlp::{DiskEncoder, RealizationKind},
    recognition::{recognize_batch, RealizationValidator, RecognitionProblem},
    utils::{ColorOutput, SolutionFormatter, TikzRenderer},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "disk_graph_recognition")]
#[command(about = "Disk and unit disk graph recognition via quadratic constraints")]
#[command(version = "0.1.0")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether graphs are (unit) disk graphs
    Recognize {
        /// Edge-list file; repeat to recognize several graphs in parallel
        #[arg(short, long, required = true)]
        graph: Vec<PathBuf>,

        /// Restrict to disks of one fixed radius
        #[arg(short, long)]
        unit: bool,

        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Time limit in seconds, 0 for none (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Solver backend (overrides config)
        #[arg(short, long, value_enum)]
        backend: Option<BackendArg>,

        /// Random seed of the local search (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Minimum squared separation of non-adjacent disks (overrides config)
        #[arg(long)]
        epsilon: Option<f64>,

        /// Solution file (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the solution record as JSON (overrides config)
        #[arg(long)]
        json: Option<PathBuf>,

        /// Check the realization against the graph after solving
        #[arg(long)]
        validate: bool,
    },

    /// Sample a random disk graph
    Generate {
        /// Number of vertices
        #[arg(short = 'n', long)]
        vertices: usize,

        /// Use unit disks
        #[arg(short, long)]
        unit: bool,

        /// Width of the center box
        #[arg(long, default_value_t = 10.0)]
        x_box: f64,

        /// Height of the center box
        #[arg(long, default_value_t = 10.0)]
        y_box: f64,

        /// Largest radius when not unit
        #[arg(long, default_value_t = 1.5)]
        max_radius: f64,

        /// Random seed; fresh entropy when omitted
        #[arg(short, long)]
        seed: Option<u64>,

        /// Edge-list file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the sampled disks
        #[arg(short, long)]
        disks: Option<PathBuf>,
    },

    /// Render a solution file as a TikZ document
    Render {
        /// Solution file; stdin when omitted
        #[arg(short, long)]
        solution: Option<PathBuf>,

        /// LaTeX file to write; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Coordinate scale factor (overrides config)
        #[arg(long)]
        scale: Option<f64>,

        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,
    },

    /// Validate a solution file against a graph
    Validate {
        /// Edge-list file
        #[arg(short, long)]
        graph: PathBuf,

        /// Solution file, one disk per line in ascending vertex order
        #[arg(short, long)]
        solution: PathBuf,

        /// Require unit radii
        #[arg(short, long)]
        unit: bool,

        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,
    },

    /// Create a default configuration and scenario graphs
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Hybrid,
    LocalSearch,
    Interval,
    Scip,
}

impl From<BackendArg> for SolverBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Hybrid => SolverBackend::Hybrid,
            BackendArg::LocalSearch => SolverBackend::LocalSearch,
            BackendArg::Interval => SolverBackend::Interval,
            BackendArg::Scip => SolverBackend::Scip,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Recognize {
            graph,
            unit,
            config,
            timeout,
            backend,
            seed,
            epsilon,
            output,
            json,
            validate,
        } => {
            let overrides = CliOverrides {
                timeout_seconds: timeout,
                backend: backend.map(SolverBackend::from),
                seed,
                epsilon,
                solution_file: output,
                json_file: json,
            };
            recognize_command(&graph, realization_kind(unit), &config, &overrides, validate)
        }
        Commands::Generate {
            vertices,
            unit,
            x_box,
            y_box,
            max_radius,
            seed,
            output,
            disks,
        } => generate_command(
            vertices,
            unit,
            (x_box, y_box, max_radius),
            seed,
            &output,
            disks.as_deref(),
        ),
        Commands::Render {
            solution,
            output,
            scale,
            config,
        } => {
            let scale = match scale {
                Some(scale) => scale,
                None => load_settings(&config)?.output.render_scale,
            };
            render_command(solution.as_deref(), output.as_deref(), scale)
        }
        Commands::Validate {
            graph,
            solution,
            unit,
            config,
        } => validate_command(&graph, &solution, realization_kind(unit), &config),
        Commands::Setup { directory, force } => setup_command(directory, force),
    }
}

fn realization_kind(unit: bool) -> RealizationKind {
    if unit {
        RealizationKind::Unit
    } else {
        RealizationKind::General
    }
}

fn load_settings(config_path: &Path) -> Result<Settings> {
    if config_path.exists() {
        Settings::from_file(&config_path.to_path_buf())
            .with_context(|| format!("Failed to load config from {}", config_path.display()))
    } else {
        info!(
            "Config file {} not found, using defaults",
            config_path.display()
        );
        Ok(Settings::default())
    }
}

fn recognize_command(
    graph_paths: &[PathBuf],
    kind: RealizationKind,
    config_path: &Path,
    overrides: &CliOverrides,
    validate: bool,
) -> Result<()> {
    let mut settings = load_settings(config_path)?;
    settings.merge_with_cli(overrides);
    settings
        .validate()
        .context("Configuration validation failed")?;

    if let [graph_path] = graph_paths {
        return recognize_single(graph_path, kind, settings, validate);
    }

    println!(
        "{}",
        ColorOutput::info(&format!("🔄 Recognizing {} graphs", graph_paths.len()))
    );
    let graphs = graph_paths
        .iter()
        .map(load_graph_from_file)
        .collect::<Result<Vec<_>>>()?;
    let names: Vec<String> = graph_paths.iter().map(|p| p.display().to_string()).collect();

    let start_time = Instant::now();
    let results = recognize_batch(&graphs, kind, &settings);
    println!("{}", SolutionFormatter::format_batch_summary(&names, &results));
    println!("Total time: {:.3}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

fn recognize_single(
    graph_path: &Path,
    kind: RealizationKind,
    settings: Settings,
    validate: bool,
) -> Result<()> {
    let mut problem = RecognitionProblem::from_file(graph_path, kind, settings.clone())
        .context("Failed to create recognition problem")?;

    println!(
        "{}",
        ColorOutput::info(&format!(
            "🔄 Recognizing {} from {} as a {} graph",
            problem.graph(),
            graph_path.display(),
            kind
        ))
    );
    debug!("\n{}", problem.encoding_statistics());

    let outcome = problem.solve().context("Failed to solve recognition problem")?;
    println!("{}", SolutionFormatter::format_outcome(&outcome));

    let Some(record) = outcome.solution() else {
        return Ok(());
    };
    println!("\n{}", SolutionFormatter::format_solution(record));

    record.write_solution_file(&settings.output.solution_file)?;
    println!("Solution written to {}", settings.output.solution_file.display());
    if let Some(json_path) = &settings.output.json_file {
        record.save_to_file(json_path)?;
        println!("JSON record written to {}", json_path.display());
    }

    if validate {
        let report =
            RealizationValidator::new(&settings.domain).validate(problem.graph(), kind, &record.disks);
        println!("\n{}", report);
        println!("{}", SolutionFormatter::format_validation(&report));

        if kind == RealizationKind::Unit {
            let encoder = DiskEncoder::new(settings.domain.clone());
            match encoder.embed_unit(problem.graph(), &record.disks) {
                Some(embedded) => {
                    let report = RealizationValidator::new(&settings.domain).validate(
                        problem.graph(),
                        RealizationKind::General,
                        &embedded,
                    );
                    println!(
                        "Scaled by {:.4} into the general domain:",
                        encoder.unit_embedding_scale()
                    );
                    println!("{}", SolutionFormatter::format_validation(&report));
                }
                None => println!(
                    "{}",
                    ColorOutput::warning("Unit witness does not survive scaling into the general domain")
                ),
            }
        }
    }

    Ok(())
}

fn generate_command(
    vertices: usize,
    unit: bool,
    (x_box, y_box, max_radius): (f64, f64, f64),
    seed: Option<u64>,
    output: &Path,
    disks_path: Option<&Path>,
) -> Result<()> {
    if !(x_box > 0.0 && y_box > 0.0 && max_radius >= 0.0) {
        anyhow::bail!("Box dimensions must be positive and the radius non-negative");
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (graph, disks) =
        random_disk_graph_with_rng(&mut rng, vertices, unit, x_box, y_box, max_radius);

    save_graph_to_file(&graph, output)?;
    println!(
        "{}",
        ColorOutput::success(&format!("Generated {} in {}", graph, output.display()))
    );

    if let Some(disks_path) = disks_path {
        save_disks_to_file(&disks, disks_path)?;
        println!("Disks written to {}", disks_path.display());
    }

    Ok(())
}

fn render_command(solution: Option<&Path>, output: Option<&Path>, scale: f64) -> Result<()> {
    if !(scale > 0.0) {
        anyhow::bail!("Render scale must be positive");
    }

    let text = match solution {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read solution file: {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read solution from stdin")?;
            buffer
        }
    };

    let tex = TikzRenderer::new(scale).render(&text)?;

    match output {
        Some(path) => std::fs::write(path, tex)
            .with_context(|| format!("Failed to write TikZ file: {}", path.display()))?,
        None => std::io::stdout()
            .write_all(tex.as_bytes())
            .context("Failed to write TikZ to stdout")?,
    }

    Ok(())
}

fn validate_command(
    graph_path: &Path,
    solution_path: &Path,
    kind: RealizationKind,
    config_path: &Path,
) -> Result<()> {
    println!("{}", ColorOutput::info("🔍 Validating realization..."));

    let settings = load_settings(config_path)?;
    let graph = load_graph_from_file(graph_path)?;
    let content = std::fs::read_to_string(solution_path)
        .with_context(|| format!("Failed to read solution file: {}", solution_path.display()))?;
    let disks = parse_disks_from_string(&content)
        .with_context(|| format!("Failed to parse solution file: {}", solution_path.display()))?;

    if disks.len() != graph.vertex_count() {
        println!(
            "{}",
            ColorOutput::warning(&format!(
                "Solution has {} disks for {} vertices",
                disks.len(),
                graph.vertex_count()
            ))
        );
    }

    // Solution lines follow ascending vertex order
    let arrangement: DiskArrangement = graph.vertices().zip(disks).collect();
    let report = RealizationValidator::new(&settings.domain).validate(&graph, kind, &arrangement);

    println!("{}", report);
    println!("{}", SolutionFormatter::format_validation(&report));

    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("🛠️  Setting up project structure..."));

    let config_dir = directory.join("config");
    let graph_dir = directory.join("input/graphs");

    for dir in [&config_dir, &graph_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        Settings::default()
            .to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    // Unit variant with a time budget
    let mut unit_config = Settings::default();
    unit_config.solver.timeout_seconds = 60;
    unit_config.output.solution_file = PathBuf::from("unit_solution.txt");
    unit_config.to_file(&config_dir.join("unit.yaml"))?;

    create_example_graphs(&graph_dir).context("Failed to create example graphs")?;
    println!("Created example graphs in: {}", graph_dir.display());

    println!("\n{}", ColorOutput::success("✅ Setup complete!"));
    println!("\nNext steps:");
    println!(
        "1. Run: cargo run -- recognize --graph {}",
        graph_dir.join("co_2c4.txt").display()
    );
    println!("2. Run: cargo run -- render --solution solution.txt --output solution.tex");

    Ok(())
}
