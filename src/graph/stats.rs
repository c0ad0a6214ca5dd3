// Graph statistics (§4.4 "Statistics") and DOT visualization export
// (SPEC_FULL §2, supplemented feature — not named in the distilled spec
// but implied by "visualization" in the component summary table).

use super::builder::detect_cycle;
use super::model::Graph;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub root_count: usize,
    pub leaf_count: usize,
    pub max_depth: u32,
    pub average_out_degree: f64,
    pub has_cycle: bool,
}

impl GraphStats {
    pub fn compute(graph: &Graph) -> Self {
        let node_count = graph.nodes.len();
        let edge_count: usize = graph.edges.values().map(Vec::len).sum();
        let root_count = graph.nodes.values().filter(|n| n.in_degree == 0).count();
        let leaf_count = graph
            .nodes
            .keys()
            .filter(|id| graph.dependents_of(id).is_empty())
            .count();
        let max_depth = graph.nodes.values().filter_map(|n| n.level).max().unwrap_or(0);
        let average_out_degree = if node_count == 0 {
            0.0
        } else {
            edge_count as f64 / node_count as f64
        };

        Self {
            node_count,
            edge_count,
            root_count,
            leaf_count,
            max_depth,
            average_out_degree,
            has_cycle: detect_cycle(graph).is_some(),
        }
    }
}

/// Renders the graph as Graphviz DOT, explicit edges solid and implicit
/// edges dashed — a read-only convenience for operators inspecting a plan
/// before applying it.
pub fn to_dot(graph: &Graph) -> String {
    let mut out = String::from("digraph panka {\n");
    for id in graph.node_ids_sorted() {
        let node = &graph.nodes[id];
        out.push_str(&format!(
            "  \"{id}\" [label=\"{id}\\n({})\"];\n",
            node.kind
        ));
    }
    for id in graph.node_ids_sorted() {
        for edge in graph.dependencies_of(id) {
            let style = match edge.edge_type {
                super::model::EdgeType::Implicit => " [style=dashed]",
                super::model::EdgeType::Order => " [style=dotted]",
                super::model::EdgeType::Explicit => "",
            };
            out.push_str(&format!("  \"{}\" -> \"{}\"{style};\n", edge.from, edge.to));
        }
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::Builder;
    use crate::parser::parse_stack;
    use std::fs;

    fn write(path: &std::path::Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn stats_reflect_a_simple_diamond() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("stack.yaml"), "apiVersion: panka/v1\nkind: Stack\nmetadata:\n  name: demo\n");
        write(&dir.path().join("services/api/a.yaml"), "apiVersion: panka/v1\nkind: S3\nmetadata:\n  name: base\n");
        write(&dir.path().join("services/api/b.yaml"), "apiVersion: panka/v1\nkind: MicroService\nmetadata:\n  name: left\nimage: x\ndependsOn: [\"base\"]\n");
        write(&dir.path().join("services/api/c.yaml"), "apiVersion: panka/v1\nkind: MicroService\nmetadata:\n  name: right\nimage: x\ndependsOn: [\"base\"]\n");
        write(&dir.path().join("services/api/d.yaml"), "apiVersion: panka/v1\nkind: Lambda\nmetadata:\n  name: top\nruntime: x\nhandler: x\ndependsOn: [\"left\", \"right\"]\n");

        let parsed = parse_stack(dir.path(), None).unwrap();
        let graph = Builder::build(&parsed).unwrap();
        let stats = GraphStats::compute(&graph);

        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.root_count, 1);
        assert_eq!(stats.leaf_count, 1);
        assert_eq!(stats.max_depth, 2);
        assert!(!stats.has_cycle);
    }

    #[test]
    fn dot_export_contains_every_node_and_edge() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("stack.yaml"), "apiVersion: panka/v1\nkind: Stack\nmetadata:\n  name: demo\n");
        write(&dir.path().join("services/api/a.yaml"), "apiVersion: panka/v1\nkind: S3\nmetadata:\n  name: base\n");
        write(&dir.path().join("services/api/b.yaml"), "apiVersion: panka/v1\nkind: MicroService\nmetadata:\n  name: app\nimage: x\ndependsOn: [\"base\"]\n");

        let parsed = parse_stack(dir.path(), None).unwrap();
        let graph = Builder::build(&parsed).unwrap();
        let dot = to_dot(&graph);
        assert!(dot.contains("\"app\" -> \"base\""));
        assert!(dot.starts_with("digraph panka"));
    }
}
