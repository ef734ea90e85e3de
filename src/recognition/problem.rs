//! Disk graph recognition problem definition

use super::solution::{RecognitionOutcome, SolutionMetadata, SolutionRecord, UndecidedReason};
use crate::config::Settings;
use crate::instance::{load_graph_from_file, Graph};
use crate::nlp::{
    ConstraintSystem, DiskEncoder, EncodingStatistics, NonlinearSolver, RealizationKind,
    SolverStatus, UnifiedSolver,
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProblemState {
    Built,
    Solving,
    Solved,
}

/// One graph, one realization kind, one constraint system
pub struct RecognitionProblem {
    settings: Settings,
    graph: Graph,
    kind: RealizationKind,
    encoder: DiskEncoder,
    system: ConstraintSystem,
    state: ProblemState,
}

impl RecognitionProblem {
    /// Encode a graph under the given settings
    pub fn new(graph: Graph, kind: RealizationKind, settings: Settings) -> Result<Self> {
        settings.validate().context("Invalid settings")?;

        let encoder = DiskEncoder::new(settings.domain.clone());
        let system = encoder.encode(&graph, kind);

        Ok(Self {
            settings,
            graph,
            kind,
            encoder,
            system,
            state: ProblemState::Built,
        })
    }

    /// Load the graph from an edge-list file
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        kind: RealizationKind,
        settings: Settings,
    ) -> Result<Self> {
        let graph = load_graph_from_file(path).context("Failed to load graph file")?;
        Self::new(graph, kind, settings)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn kind(&self) -> RealizationKind {
        self.kind
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn system(&self) -> &ConstraintSystem {
        &self.system
    }

    /// Get encoding statistics
    pub fn encoding_statistics(&self) -> EncodingStatistics {
        self.system.statistics()
    }

    /// Solve with the backend selected by the settings
    pub fn solve(&mut self) -> Result<RecognitionOutcome> {
        let mut solver = UnifiedSolver::from_config(&self.settings.solver)?;
        self.solve_with(&mut solver)
    }

    /// Solve with any solver; a problem can only be solved once
    pub fn solve_with(&mut self, solver: &mut dyn NonlinearSolver) -> Result<RecognitionOutcome> {
        if self.state != ProblemState::Built {
            anyhow::bail!("Recognition problem has already been solved");
        }
        self.state = ProblemState::Solving;

        info!(
            "Recognizing {} as a {} graph ({} variables, {} constraints)",
            self.graph,
            self.kind,
            self.system.variable_count(),
            self.system.constraint_count()
        );

        let handles = self
            .system
            .submit(solver)
            .context("Failed to submit constraint system")?;
        if let Some(limit) = self.settings.solver.time_limit() {
            solver.set_time_limit(limit);
        }

        let start_time = Instant::now();
        let status = solver.solve().context("Solver failed")?;
        let solve_time = start_time.elapsed();
        self.state = ProblemState::Solved;

        debug!(?status, seconds = solve_time.as_secs_f64(), "solver returned");

        let outcome = match status {
            SolverStatus::Optimal => {
                let disks = self
                    .encoder
                    .decode(&self.system, &handles, solver)
                    .context("Failed to decode solver witness")?;
                let min_slack = self
                    .system
                    .assignment(&disks)
                    .map(|values| self.system.min_slack(&values))
                    .filter(|slack| slack.is_finite());
                if min_slack.is_some_and(|slack| slack < 0.0) {
                    warn!(?min_slack, "witness violates a constraint within solver tolerance");
                }

                let metadata = SolutionMetadata {
                    backend: solver.statistics().backend.to_string(),
                    solve_time_ms: solve_time.as_millis() as u64,
                    min_slack,
                };
                RecognitionOutcome::Feasible(SolutionRecord::new(self.kind, disks, metadata))
            }
            SolverStatus::Infeasible => RecognitionOutcome::Infeasible,
            SolverStatus::TimeLimit => RecognitionOutcome::Unknown(UndecidedReason::TimeLimit),
            SolverStatus::Unknown | SolverStatus::NotSolved => {
                RecognitionOutcome::Unknown(UndecidedReason::Inconclusive)
            }
        };

        info!("Result: {}", outcome);
        Ok(outcome)
    }
}

/// Recognize a single graph with the built-in solver
pub fn recognize(graph: Graph, kind: RealizationKind, settings: Settings) -> Result<RecognitionOutcome> {
    RecognitionProblem::new(graph, kind, settings)?.solve()
}

/// Recognize independent graphs in parallel, one solver per graph
pub fn recognize_batch(
    graphs: &[Graph],
    kind: RealizationKind,
    settings: &Settings,
) -> Vec<Result<RecognitionOutcome>> {
    graphs
        .par_iter()
        .map(|graph| recognize(graph.clone(), kind, settings.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverBackend;
    use crate::instance::{random_disk_graph_with_rng, Disk};
    use crate::nlp::{QuadraticConstraint, SolverStatistics, VarId};
    use crate::recognition::RealizationValidator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    /// Solver that answers with a fixed status and fixed values
    struct ScriptedSolver {
        answer: SolverStatus,
        values: Vec<f64>,
        declared: usize,
        constraints: usize,
        time_limit: Option<Duration>,
    }

    impl ScriptedSolver {
        fn new(answer: SolverStatus, values: Vec<f64>) -> Self {
            Self {
                answer,
                values,
                declared: 0,
                constraints: 0,
                time_limit: None,
            }
        }
    }

    impl NonlinearSolver for ScriptedSolver {
        fn add_variable(&mut self, _name: &str, _lower: f64, _upper: f64) -> Result<VarId> {
            self.declared += 1;
            Ok(VarId(self.declared - 1))
        }

        fn add_constraint(&mut self, _constraint: QuadraticConstraint) -> Result<()> {
            self.constraints += 1;
            Ok(())
        }

        fn set_time_limit(&mut self, limit: Duration) {
            self.time_limit = Some(limit);
        }

        fn solve(&mut self) -> Result<SolverStatus> {
            Ok(self.answer)
        }

        fn status(&self) -> SolverStatus {
            self.answer
        }

        fn value(&self, var: VarId) -> Option<f64> {
            match self.answer {
                SolverStatus::Optimal => self.values.get(var.index()).copied(),
                _ => None,
            }
        }

        fn statistics(&self) -> SolverStatistics {
            SolverStatistics::new("scripted")
        }
    }

    fn co_two_c4() -> Graph {
        let c4 = Graph::cycle(&[1, 2, 3, 4]).unwrap();
        c4.disjoint_union(&c4).complement()
    }

    fn k33() -> Graph {
        let c3 = Graph::cycle(&[1, 2, 3]).unwrap();
        c3.disjoint_union(&c3).complement()
    }

    #[test]
    fn test_single_edge_is_feasible() {
        let graph = Graph::from_edges(2, &[(1, 2)]).unwrap();
        let mut problem =
            RecognitionProblem::new(graph.clone(), RealizationKind::General, Settings::default())
                .unwrap();
        assert_eq!(problem.system().constraint_count(), 1);

        let outcome = problem.solve().unwrap();
        let record = outcome.solution().expect("single edge is a disk graph");
        assert_eq!(record.vertex_count(), 2);
        assert!(record.disks[&1].intersects(&record.disks[&2]));

        let report = RealizationValidator::new(&Settings::default().domain).validate(
            &graph,
            RealizationKind::General,
            &record.disks,
        );
        assert!(report.is_valid, "{}", report);
    }

    #[test]
    fn test_empty_graph_is_feasible() {
        let mut problem =
            RecognitionProblem::new(Graph::empty(), RealizationKind::General, Settings::default())
                .unwrap();
        assert!(problem.system().is_empty());

        let outcome = problem.solve().unwrap();
        let record = outcome.solution().unwrap();
        assert!(record.disks.is_empty());
        assert_eq!(record.metadata.min_slack, None);
        assert_eq!(record.to_solution_text(), "");
    }

    #[test]
    fn test_co_two_c4_is_disk_graph() {
        let graph = co_two_c4();
        let settings = Settings::default();

        let outcome = recognize(graph.clone(), RealizationKind::General, settings.clone()).unwrap();
        let record = outcome.solution().expect("complement of C4 + C4 is a disk graph");
        assert_eq!(record.vertex_count(), 8);

        let report = RealizationValidator::new(&settings.domain).validate(
            &graph,
            RealizationKind::General,
            &record.disks,
        );
        assert!(report.is_valid, "{}", report);
    }

    #[test]
    fn test_k33_is_never_feasible() {
        let mut settings = Settings::default();
        settings.solver.max_restarts = 20;
        settings.solver.max_iterations = 500;
        settings.solver.node_limit = 2_000;

        let outcome = recognize(k33(), RealizationKind::General, settings).unwrap();
        // The built-in searches cannot refute K3,3, they give up instead
        assert_eq!(
            outcome,
            RecognitionOutcome::Unknown(UndecidedReason::Inconclusive),
            "{}",
            outcome
        );
    }

    #[cfg(feature = "scip")]
    #[test]
    fn test_k33_is_infeasible_with_scip() {
        let mut settings = Settings::default();
        settings.solver.backend = SolverBackend::Scip;
        settings.solver.timeout_seconds = 300;

        let outcome = recognize(k33(), RealizationKind::General, settings).unwrap();
        assert_eq!(outcome, RecognitionOutcome::Infeasible);
    }

    #[cfg(feature = "scip")]
    #[test]
    fn test_co_two_c4_with_scip() {
        let graph = co_two_c4();
        let mut settings = Settings::default();
        settings.solver.backend = SolverBackend::Scip;
        settings.solver.timeout_seconds = 300;

        let outcome = recognize(graph.clone(), RealizationKind::General, settings.clone()).unwrap();
        let record = outcome.solution().expect("complement of C4 + C4 is a disk graph");
        assert_eq!(record.metadata.backend, "scip");
        let report = RealizationValidator::new(&settings.domain).validate(
            &graph,
            RealizationKind::General,
            &record.disks,
        );
        assert!(report.is_valid, "{}", report);
    }

    #[cfg(not(feature = "scip"))]
    #[test]
    fn test_scip_backend_unavailable() {
        let mut settings = Settings::default();
        settings.solver.backend = SolverBackend::Scip;
        assert!(recognize(Graph::with_vertices(1), RealizationKind::General, settings).is_err());
    }

    #[test]
    fn test_infeasible_reported_by_solver() {
        let mut problem =
            RecognitionProblem::new(k33(), RealizationKind::General, Settings::default()).unwrap();
        let mut solver = ScriptedSolver::new(SolverStatus::Infeasible, Vec::new());

        let outcome = problem.solve_with(&mut solver).unwrap();
        assert_eq!(outcome, RecognitionOutcome::Infeasible);
        assert_eq!(solver.declared, 18);
        assert_eq!(solver.constraints, 15);
    }

    #[test]
    fn test_unit_box_too_small_is_infeasible() {
        let mut settings = Settings::default();
        settings.domain.unit.x_max = 2.0;
        settings.domain.unit.y_max = 2.0;
        settings.solver.backend = SolverBackend::Interval;

        let outcome = recognize(Graph::with_vertices(2), RealizationKind::Unit, settings).unwrap();
        assert!(outcome.is_infeasible());
    }

    #[test]
    fn test_unknown_is_not_infeasible() {
        for (answer, reason) in [
            (SolverStatus::TimeLimit, UndecidedReason::TimeLimit),
            (SolverStatus::Unknown, UndecidedReason::Inconclusive),
        ] {
            let mut problem =
                RecognitionProblem::new(k33(), RealizationKind::Unit, Settings::default()).unwrap();
            let mut solver = ScriptedSolver::new(answer, Vec::new());

            let outcome = problem.solve_with(&mut solver).unwrap();
            assert_eq!(outcome, RecognitionOutcome::Unknown(reason));
            assert!(!outcome.is_infeasible());
        }
    }

    #[test]
    fn test_scripted_witness_is_decoded() {
        let graph = Graph::from_edges(2, &[(1, 2)]).unwrap();
        let mut settings = Settings::default();
        settings.solver.timeout_seconds = 5;

        let mut problem = RecognitionProblem::new(graph, RealizationKind::Unit, settings).unwrap();
        let mut solver = ScriptedSolver::new(SolverStatus::Optimal, vec![1.0, 1.0, 2.5, 1.0]);

        let outcome = problem.solve_with(&mut solver).unwrap();
        assert_eq!(solver.time_limit, Some(Duration::from_secs(5)));

        let record = outcome.solution().unwrap();
        assert_eq!(record.disks[&2], Disk::new(2.5, 1.0, 1.0));
        assert_eq!(record.metadata.backend, "scripted");
        assert_eq!(record.to_solution_text(), "(1,1,1) ; \n(2.5,1,1) ; \n");
        let slack = record.metadata.min_slack.unwrap();
        assert!((slack - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_cannot_solve_twice() {
        let mut problem =
            RecognitionProblem::new(Graph::with_vertices(1), RealizationKind::Unit, Settings::default())
                .unwrap();
        assert!(problem.solve().unwrap().is_feasible());
        assert!(problem.solve().is_err());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = Settings::default();
        settings.domain.epsilon = 0.0;
        assert!(RecognitionProblem::new(Graph::empty(), RealizationKind::General, settings).is_err());
    }

    fn assert_round_trip(graphs: &[Graph], kind: RealizationKind, settings: &Settings) {
        let results = recognize_batch(graphs, kind, settings);
        assert_eq!(results.len(), graphs.len());
        for (graph, result) in graphs.iter().zip(results) {
            let outcome = result.unwrap();
            let record = outcome
                .solution()
                .unwrap_or_else(|| panic!("sampled {} graph {} came back {}", kind, graph, outcome));
            let report =
                RealizationValidator::new(&settings.domain).validate(graph, kind, &record.disks);
            assert!(report.is_valid, "{}", report);
        }
    }

    #[test]
    fn test_random_disk_graphs_round_trip() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut settings = Settings::default();
        settings.solver.timeout_seconds = 60;

        let graphs: Vec<Graph> = [4, 4, 6, 6, 8, 8]
            .into_iter()
            .map(|n| random_disk_graph_with_rng(&mut rng, n, false, 3.0, 3.0, 1.0).0)
            .collect();
        assert_round_trip(&graphs, RealizationKind::General, &settings);
    }

    #[test]
    fn test_random_unit_disk_graphs_round_trip() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut settings = Settings::default();
        settings.solver.timeout_seconds = 60;

        // Centers in [0, 6]² fit the default [1, 10]² unit box after a shift
        let graphs: Vec<Graph> = [4, 6, 8]
            .into_iter()
            .map(|n| random_disk_graph_with_rng(&mut rng, n, true, 6.0, 6.0, 1.0).0)
            .collect();
        assert_round_trip(&graphs, RealizationKind::Unit, &settings);
    }

    #[test]
    fn test_unit_witness_embeds_as_disk_graph() {
        let mut rng = StdRng::seed_from_u64(5);
        let graph = random_disk_graph_with_rng(&mut rng, 6, true, 6.0, 6.0, 1.0).0;
        let settings = Settings::default();
        let encoder = DiskEncoder::new(settings.domain.clone());
        let scale = encoder.unit_embedding_scale();

        // Non-edge gaps shrink by s², so the unit witness must clear ε / s²
        let mut unit_settings = settings.clone();
        unit_settings.domain.epsilon = 2.0 * settings.domain.epsilon / (scale * scale);
        unit_settings.solver.timeout_seconds = 60;

        let outcome = recognize(graph.clone(), RealizationKind::Unit, unit_settings).unwrap();
        let record = outcome.solution().expect("sampled unit disk graphs are realizable");
        let embedded = encoder.embed_unit(&graph, &record.disks).unwrap();

        let report = RealizationValidator::new(&settings.domain).validate(
            &graph,
            RealizationKind::General,
            &embedded,
        );
        assert!(report.is_valid, "{}", report);
    }
}
