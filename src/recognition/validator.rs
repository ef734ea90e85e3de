//! Independent check of a disk arrangement against its graph

use crate::config::DomainConfig;
use crate::instance::{build_graph_from_disks, Disk, DiskArrangement, Graph, PairKind, VertexId};
use crate::nlp::RealizationKind;
use std::fmt;
use std::time::Instant;

/// Re-derives adjacency from an arrangement and compares it with a graph
pub struct RealizationValidator {
    epsilon: f64,
    unit_radius: f64,
}

/// A vertex pair whose disks disagree with the graph
#[derive(Debug, Clone, PartialEq)]
pub struct PairMismatch {
    pub u: VertexId,
    pub v: VertexId,
    pub expected: PairKind,
    /// `|cu - cv|² - (ru + rv)²` of the two disks
    pub gap: f64,
}

/// Result of validating an arrangement
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Graph vertices without a disk
    pub missing_vertices: Vec<VertexId>,
    /// Disks for vertices the graph does not have
    pub extra_vertices: Vec<VertexId>,
    pub negative_radii: Vec<VertexId>,
    /// Unit realizations whose radius differs from the configured constant
    pub radius_mismatches: Vec<VertexId>,
    pub mismatched_pairs: Vec<PairMismatch>,
    /// Smallest gap over non-edges; positive means separated
    pub min_non_edge_gap: Option<f64>,
    /// Largest gap over edges; non-positive means overlapping
    pub max_edge_gap: Option<f64>,
    /// Pairs whose gap lies within epsilon of zero
    pub near_boundary_pairs: Vec<(VertexId, VertexId)>,
    pub validation_time_ms: u64,
}

impl RealizationValidator {
    pub fn new(domain: &DomainConfig) -> Self {
        Self {
            epsilon: domain.epsilon,
            unit_radius: domain.unit_radius,
        }
    }

    /// Validate that the disks realize exactly the graph's adjacency
    pub fn validate(
        &self,
        graph: &Graph,
        kind: RealizationKind,
        arrangement: &DiskArrangement,
    ) -> ValidationReport {
        let start_time = Instant::now();

        let missing_vertices: Vec<_> = graph
            .vertices()
            .filter(|v| !arrangement.contains_key(v))
            .collect();
        let extra_vertices: Vec<_> = arrangement
            .keys()
            .copied()
            .filter(|&v| !graph.has_vertex(v))
            .collect();
        let negative_radii: Vec<_> = arrangement
            .iter()
            .filter(|(_, d)| d.r < 0.0)
            .map(|(&v, _)| v)
            .collect();
        let radius_mismatches: Vec<_> = match kind {
            RealizationKind::Unit => arrangement
                .iter()
                .filter(|(_, d)| (d.r - self.unit_radius).abs() > f64::EPSILON)
                .map(|(&v, _)| v)
                .collect(),
            RealizationKind::General => Vec::new(),
        };

        // Rebuild adjacency over the covered vertices, relabelled 1..=k
        let covered: Vec<(VertexId, Disk)> = graph
            .vertices()
            .filter_map(|v| arrangement.get(&v).map(|&d| (v, d)))
            .collect();
        let disks: Vec<Disk> = covered.iter().map(|&(_, d)| d).collect();
        let realized = build_graph_from_disks(&disks);

        let mut mismatched_pairs = Vec::new();
        let mut near_boundary_pairs = Vec::new();
        let mut min_non_edge_gap: Option<f64> = None;
        let mut max_edge_gap: Option<f64> = None;

        for (i, &(u, du)) in covered.iter().enumerate() {
            for (j, &(v, dv)) in covered.iter().enumerate().skip(i + 1) {
                let gap = du.gap(&dv);
                let expected = if graph.has_edge(u, v) {
                    max_edge_gap = Some(max_edge_gap.map_or(gap, |m| m.max(gap)));
                    PairKind::Edge
                } else {
                    min_non_edge_gap = Some(min_non_edge_gap.map_or(gap, |m| m.min(gap)));
                    PairKind::NonEdge
                };

                let intersects = realized.has_edge(index_vertex(i), index_vertex(j));
                if intersects != (expected == PairKind::Edge) {
                    mismatched_pairs.push(PairMismatch { u, v, expected, gap });
                }
                if gap.abs() < self.epsilon {
                    near_boundary_pairs.push((u, v));
                }
            }
        }

        let is_valid = missing_vertices.is_empty()
            && extra_vertices.is_empty()
            && negative_radii.is_empty()
            && radius_mismatches.is_empty()
            && mismatched_pairs.is_empty();

        ValidationReport {
            is_valid,
            missing_vertices,
            extra_vertices,
            negative_radii,
            radius_mismatches,
            mismatched_pairs,
            min_non_edge_gap,
            max_edge_gap,
            near_boundary_pairs,
            validation_time_ms: start_time.elapsed().as_millis() as u64,
        }
    }
}

fn index_vertex(index: usize) -> VertexId {
    index as VertexId + 1
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation Report:")?;
        writeln!(f, "  Valid: {}", self.is_valid)?;
        if !self.missing_vertices.is_empty() {
            writeln!(f, "  Vertices without a disk: {:?}", self.missing_vertices)?;
        }
        if !self.extra_vertices.is_empty() {
            writeln!(f, "  Disks for unknown vertices: {:?}", self.extra_vertices)?;
        }
        if !self.negative_radii.is_empty() {
            writeln!(f, "  Negative radii: {:?}", self.negative_radii)?;
        }
        if !self.radius_mismatches.is_empty() {
            writeln!(f, "  Non-unit radii: {:?}", self.radius_mismatches)?;
        }
        writeln!(f, "  Mismatched pairs: {}", self.mismatched_pairs.len())?;
        for m in &self.mismatched_pairs {
            writeln!(
                f,
                "    ({}, {}) expected {:?}, gap {:.3e}",
                m.u, m.v, m.expected, m.gap
            )?;
        }
        if let Some(gap) = self.max_edge_gap {
            writeln!(f, "  Largest edge gap: {:.3e}", gap)?;
        }
        if let Some(gap) = self.min_non_edge_gap {
            writeln!(f, "  Smallest non-edge gap: {:.3e}", gap)?;
        }
        writeln!(f, "  Near-boundary pairs: {}", self.near_boundary_pairs.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrangement(disks: &[(VertexId, Disk)]) -> DiskArrangement {
        disks.iter().copied().collect()
    }

    #[test]
    fn test_valid_path() {
        let graph = Graph::from_edges(3, &[(1, 2), (2, 3)]).unwrap();
        let disks = arrangement(&[
            (1, Disk::new(1.0, 1.0, 0.3)),
            (2, Disk::new(1.5, 1.0, 0.3)),
            (3, Disk::new(2.0, 1.0, 0.3)),
        ]);

        let validator = RealizationValidator::new(&DomainConfig::default());
        let report = validator.validate(&graph, RealizationKind::General, &disks);

        assert!(report.is_valid, "{}", report);
        assert!(report.max_edge_gap.unwrap() < 0.0);
        assert!(report.min_non_edge_gap.unwrap() > 0.0);
        assert!(report.near_boundary_pairs.is_empty());
    }

    #[test]
    fn test_detects_mismatch() {
        let graph = Graph::from_edges(2, &[(1, 2)]).unwrap();
        let disks = arrangement(&[(1, Disk::new(1.0, 1.0, 0.1)), (2, Disk::new(2.0, 1.0, 0.1))]);

        let report = RealizationValidator::new(&DomainConfig::default()).validate(
            &graph,
            RealizationKind::General,
            &disks,
        );

        assert!(!report.is_valid);
        assert_eq!(report.mismatched_pairs.len(), 1);
        assert_eq!(report.mismatched_pairs[0].expected, PairKind::Edge);
        assert!(report.mismatched_pairs[0].gap > 0.0);
    }

    #[test]
    fn test_tangent_disks_are_near_boundary() {
        let graph = Graph::from_edges(2, &[(1, 2)]).unwrap();
        let disks = arrangement(&[(1, Disk::new(1.0, 1.0, 0.25)), (2, Disk::new(1.5, 1.0, 0.25))]);

        let report = RealizationValidator::new(&DomainConfig::default()).validate(
            &graph,
            RealizationKind::General,
            &disks,
        );

        assert!(report.is_valid);
        assert_eq!(report.near_boundary_pairs, vec![(1, 2)]);
    }

    #[test]
    fn test_coverage_and_radius_checks() {
        let graph = Graph::with_vertices(2);
        let disks = arrangement(&[(1, Disk::new(1.0, 1.0, 1.0)), (5, Disk::new(9.0, 9.0, 0.5))]);

        let report = RealizationValidator::new(&DomainConfig::default()).validate(
            &graph,
            RealizationKind::Unit,
            &disks,
        );

        assert!(!report.is_valid);
        assert_eq!(report.missing_vertices, vec![2]);
        assert_eq!(report.extra_vertices, vec![5]);
        assert_eq!(report.radius_mismatches, vec![5]);
        assert!(report.mismatched_pairs.is_empty());
    }

    #[test]
    fn test_negative_radius() {
        let graph = Graph::with_vertices(1);
        let disks = arrangement(&[(1, Disk::new(1.0, 1.0, -0.5))]);

        let report = RealizationValidator::new(&DomainConfig::default()).validate(
            &graph,
            RealizationKind::General,
            &disks,
        );

        assert!(!report.is_valid);
        assert_eq!(report.negative_radii, vec![1]);
        assert_eq!(report.min_non_edge_gap, None);
    }
}
