//! File I/O for graphs and disk lists

use super::{Disk, Graph, VertexId};
use anyhow::{Context, Result};
use std::path::Path;

/// Load a graph from an edge-list file
pub fn load_graph_from_file<P: AsRef<Path>>(path: P) -> Result<Graph> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read graph file: {}", path.as_ref().display()))?;

    parse_graph_from_string(&content)
        .with_context(|| format!("Failed to parse graph from file: {}", path.as_ref().display()))
}

/// Parse a graph from its edge-list representation.
///
/// Each line is either `u v` (an edge) or a single `v` (an isolated vertex).
/// `#` starts a comment.
pub fn parse_graph_from_string(content: &str) -> Result<Graph> {
    let mut graph = Graph::empty();
    let mut edges = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line = strip_comment(line);
        if line.is_empty() {
            continue;
        }

        let ids = line
            .split_whitespace()
            .map(|token| {
                token.parse::<VertexId>().with_context(|| {
                    format!("Invalid vertex '{}' on line {}", token, line_idx + 1)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        match ids.as_slice() {
            [v] => graph.add_vertex(*v),
            [u, v] => {
                graph.add_vertex(*u);
                graph.add_vertex(*v);
                edges.push((*u, *v, line_idx + 1));
            }
            _ => anyhow::bail!(
                "Line {} has {} fields, expected 1 or 2",
                line_idx + 1,
                ids.len()
            ),
        }
    }

    for (u, v, line_no) in edges {
        graph
            .add_edge(u, v)
            .with_context(|| format!("Invalid edge on line {}", line_no))?;
    }

    Ok(graph)
}

/// Save a graph as an edge list
pub fn save_graph_to_file<P: AsRef<Path>>(graph: &Graph, path: P) -> Result<()> {
    write_creating_parent(path.as_ref(), &graph_to_string(graph))
}

/// Convert a graph to its edge-list representation
pub fn graph_to_string(graph: &Graph) -> String {
    let mut result = String::new();
    for v in graph.vertices().filter(|&v| graph.degree(v) == 0) {
        result.push_str(&format!("{}\n", v));
    }
    for (u, v) in graph.edges() {
        result.push_str(&format!("{} {}\n", u, v));
    }
    result
}

/// Load disks from a file, one `x y r` triple per line
pub fn load_disks_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Disk>> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read disk file: {}", path.as_ref().display()))?;

    parse_disks_from_string(&content)
        .with_context(|| format!("Failed to parse disks from file: {}", path.as_ref().display()))
}

/// Parse disks, accepting `x y r`, `x,y,r` and the solution-file form `(x,y,r) ;`
pub fn parse_disks_from_string(content: &str) -> Result<Vec<Disk>> {
    let mut disks = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line = strip_comment(line);
        if line.is_empty() {
            continue;
        }

        let body = line.split(';').next().unwrap_or_default();
        let fields: Vec<f64> = body
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .map(|field| {
                field.parse::<f64>().with_context(|| {
                    format!("Invalid number '{}' on line {}", field, line_idx + 1)
                })
            })
            .collect::<Result<_>>()?;

        let [x, y, r] = fields.as_slice() else {
            anyhow::bail!(
                "Line {} has {} fields, expected x, y and r",
                line_idx + 1,
                fields.len()
            );
        };
        if *r < 0.0 {
            anyhow::bail!("Negative radius {} on line {}", r, line_idx + 1);
        }
        disks.push(Disk::new(*x, *y, *r));
    }

    Ok(disks)
}

/// Save disks, one `x y r` triple per line
pub fn save_disks_to_file<P: AsRef<Path>>(disks: &[Disk], path: P) -> Result<()> {
    let content: String = disks
        .iter()
        .map(|d| format!("{} {} {}\n", d.x, d.y, d.r))
        .collect();
    write_creating_parent(path.as_ref(), &content)
}

/// Write the scenario graphs used for smoke testing into a directory
pub fn create_example_graphs<P: AsRef<Path>>(output_dir: P) -> Result<()> {
    let dir = output_dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let square = Graph::cycle(&[1, 2, 3, 4])?;
    let triangle = Graph::cycle(&[1, 2, 3])?;

    save_graph_to_file(&square.disjoint_union(&square).complement(), dir.join("co_2c4.txt"))
        .context("Failed to write co_2c4.txt")?;
    save_graph_to_file(
        &triangle.disjoint_union(&triangle).complement(),
        dir.join("k33.txt"),
    )
    .context("Failed to write k33.txt")?;
    save_graph_to_file(&Graph::from_edges(2, &[(1, 2)])?, dir.join("edge.txt"))
        .context("Failed to write edge.txt")?;
    save_graph_to_file(&Graph::cycle(&[1, 2, 3, 4, 5])?, dir.join("c5.txt"))
        .context("Failed to write c5.txt")?;

    Ok(())
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default().trim()
}

fn write_creating_parent(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    Ok(())
}
