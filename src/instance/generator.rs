//! Disk intersection graphs from explicit or random disk arrangements

use super::{Disk, Graph};
use rand::Rng;

/// Build the intersection graph of a list of disks.
///
/// Vertex `i` (1-based) is the `i`-th disk; two vertices are adjacent iff
/// their disks intersect or touch.
pub fn build_graph_from_disks(disks: &[Disk]) -> Graph {
    Graph::from_adjacency(disks.len(), |u, v| {
        disks[u as usize - 1].intersects(&disks[v as usize - 1])
    })
}

/// Random disk graph on `n` vertices using the thread-local RNG
pub fn random_disk_graph(
    n: usize,
    unit: bool,
    x_box: f64,
    y_box: f64,
    max_radius: f64,
) -> (Graph, Vec<Disk>) {
    random_disk_graph_with_rng(&mut rand::thread_rng(), n, unit, x_box, y_box, max_radius)
}

/// Random disk graph drawn from the given RNG.
///
/// Centers are uniform in `[0, x_box] × [0, y_box]`; radii are uniform in
/// `[0, max_radius]`, or fixed to 1 when `unit` is set.
pub fn random_disk_graph_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    unit: bool,
    x_box: f64,
    y_box: f64,
    max_radius: f64,
) -> (Graph, Vec<Disk>) {
    let disks: Vec<Disk> = (0..n)
        .map(|_| {
            let x = x_box * rng.gen::<f64>();
            let y = y_box * rng.gen::<f64>();
            let r = if unit {
                1.0
            } else {
                max_radius * rng.gen::<f64>()
            };
            Disk::new(x, y, r)
        })
        .collect();

    (build_graph_from_disks(&disks), disks)
}

/// Random unit disk graph on `n` vertices
pub fn random_unit_disk_graph(n: usize, x_box: f64, y_box: f64) -> (Graph, Vec<Disk>) {
    random_disk_graph(n, true, x_box, y_box, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_build_from_disks() {
        let disks = vec![
            Disk::new(0.0, 0.0, 1.0),
            Disk::new(1.5, 0.0, 0.5),
            Disk::new(5.0, 5.0, 1.0),
            Disk::new(3.0, 0.0, 1.0),
        ];
        let graph = build_graph_from_disks(&disks);

        assert_eq!(graph.vertex_count(), 4);
        assert!(graph.has_edge(1, 2));
        // Tangent at (2, 0)
        assert!(graph.has_edge(2, 4));
        assert!(!graph.has_edge(1, 3));
        assert!(!graph.has_edge(1, 4));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_empty_input() {
        let graph = build_graph_from_disks(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.pair_count(), 0);
    }

    #[test]
    fn test_random_graph_respects_box() {
        let mut rng = StdRng::seed_from_u64(7);
        let (graph, disks) = random_disk_graph_with_rng(&mut rng, 20, false, 3.0, 2.0, 0.5);

        assert_eq!(graph.vertex_count(), 20);
        assert_eq!(disks.len(), 20);
        for disk in &disks {
            assert!((0.0..=3.0).contains(&disk.x));
            assert!((0.0..=2.0).contains(&disk.y));
            assert!((0.0..=0.5).contains(&disk.r));
        }
        assert_eq!(build_graph_from_disks(&disks), graph);
    }

    #[test]
    fn test_random_unit_graph_has_unit_radii() {
        let (graph, disks) = random_unit_disk_graph(10, 4.0, 4.0);
        assert_eq!(graph.vertex_count(), 10);
        assert!(disks.iter().all(|d| d.r == 1.0));
    }

    fn disk_strategy() -> impl Strategy<Value = Disk> {
        (0.0..4.0f64, 0.0..4.0f64, 0.0..1.5f64).prop_map(|(x, y, r)| Disk::new(x, y, r))
    }

    proptest! {
        #[test]
        fn prop_generation_is_deterministic(disks in prop::collection::vec(disk_strategy(), 0..12)) {
            prop_assert_eq!(build_graph_from_disks(&disks), build_graph_from_disks(&disks));
        }

        #[test]
        fn prop_shrinking_radii_only_removes_edges(disks in prop::collection::vec(disk_strategy(), 0..12)) {
            let original = build_graph_from_disks(&disks);
            let shrunk: Vec<Disk> = disks.iter().map(|d| Disk::new(d.x, d.y, 0.0)).collect();
            let shrunk_graph = build_graph_from_disks(&shrunk);

            for (u, v) in shrunk_graph.edges() {
                prop_assert!(original.has_edge(u, v));
            }
        }
    }
}
