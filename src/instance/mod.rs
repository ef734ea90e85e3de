//! Graphs, disks and the instances built from them

pub mod generator;
pub mod graph;
pub mod io;

pub use generator::{
    build_graph_from_disks, random_disk_graph, random_disk_graph_with_rng, random_unit_disk_graph,
};
pub use graph::{Disk, DiskArrangement, Graph, GraphError, PairKind, VertexId};
pub use io::{
    create_example_graphs, load_disks_from_file, load_graph_from_file, save_disks_to_file,
    save_graph_to_file,
};
