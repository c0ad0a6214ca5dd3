// Graph construction (§4.4 "Produced by a Builder...", cycle detection,
// level calculation).

use super::model::{Edge, EdgeType, Graph, Node, NodeId, VisitState};
use crate::error::PankaError;
use crate::parser::StackParseResult;
use crate::Result;
use std::collections::{HashMap, HashSet};

pub struct Builder;

impl Builder {
    /// One node per component; no node for the `Stack`/`Service` shells.
    /// Edges are only added for references that resolve to a known
    /// component — anything that doesn't resolve was already surfaced as a
    /// parse warning (§4.3 step 7) and is the caller's concern, not a
    /// build-time failure here.
    pub fn build(parse_result: &StackParseResult) -> Result<Graph> {
        let known: HashSet<&str> = parse_result.component_names();

        let mut nodes = HashMap::new();
        let mut edges: HashMap<NodeId, Vec<Edge>> = HashMap::new();
        let mut reverse_edges: HashMap<NodeId, Vec<Edge>> = HashMap::new();

        for resource in &parse_result.components {
            let id = resource.name().to_string();

            let mut declared_dependencies = Vec::new();
            let mut node_edges = Vec::new();

            for dep in resource.depends_on() {
                if known.contains(dep.as_str()) {
                    declared_dependencies.push(dep.clone());
                    node_edges.push(Edge {
                        from: id.clone(),
                        to: dep.clone(),
                        edge_type: EdgeType::Explicit,
                    });
                }
            }
            for dep in resource.implicit_dependencies() {
                if known.contains(dep.as_str()) && !declared_dependencies.contains(&dep) {
                    declared_dependencies.push(dep.clone());
                    node_edges.push(Edge {
                        from: id.clone(),
                        to: dep.clone(),
                        edge_type: EdgeType::Implicit,
                    });
                }
            }

            for edge in &node_edges {
                reverse_edges
                    .entry(edge.to.clone())
                    .or_default()
                    .push(edge.clone());
            }

            nodes.insert(
                id.clone(),
                Node {
                    id: id.clone(),
                    kind: resource.kind_name().to_string(),
                    resource: resource.clone(),
                    in_degree: declared_dependencies.len(),
                    declared_dependencies,
                    level: None,
                },
            );
            edges.insert(id, node_edges);
        }

        let mut graph = Graph {
            nodes,
            edges,
            reverse_edges,
        };

        if let Some(cycle) = detect_cycle(&graph) {
            return Err(PankaError::Validation(format!(
                "dependency cycle: {}",
                cycle.join(" -> ")
            )));
        }

        calculate_levels(&mut graph)?;
        Ok(graph)
    }
}

/// Three-colour DFS (§4.4 "Cycle detection"). Returns the cycle path from
/// its start node onward, if any.
pub(crate) fn detect_cycle(graph: &Graph) -> Option<Vec<NodeId>> {
    let mut state: HashMap<&str, VisitState> = graph
        .nodes
        .keys()
        .map(|id| (id.as_str(), VisitState::Unvisited))
        .collect();
    let mut stack_path: Vec<NodeId> = Vec::new();

    for start in graph.node_ids_sorted() {
        if state[start.as_str()] == VisitState::Unvisited {
            if let Some(cycle) = visit(graph, start, &mut state, &mut stack_path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit<'a>(
    graph: &'a Graph,
    id: &'a str,
    state: &mut HashMap<&'a str, VisitState>,
    stack_path: &mut Vec<NodeId>,
) -> Option<Vec<NodeId>> {
    state.insert(id, VisitState::OnStack);
    stack_path.push(id.to_string());

    for edge in graph.dependencies_of(id) {
        match state.get(edge.to.as_str()) {
            Some(VisitState::OnStack) => {
                let start = stack_path.iter().position(|n| n == &edge.to).unwrap_or(0);
                let mut cycle: Vec<NodeId> = stack_path[start..].to_vec();
                cycle.push(edge.to.clone());
                return Some(cycle);
            }
            Some(VisitState::Unvisited) => {
                if let Some(cycle) = visit(graph, &edge.to, state, stack_path) {
                    return Some(cycle);
                }
            }
            _ => {}
        }
    }

    stack_path.pop();
    state.insert(id, VisitState::Done);
    None
}

/// Memoized DFS level calculation (§4.4 "Level calculation").
pub(crate) fn calculate_levels(graph: &mut Graph) -> Result<()> {
    let mut memo: HashMap<NodeId, u32> = HashMap::new();
    let ids: Vec<NodeId> = graph.node_ids_sorted().into_iter().cloned().collect();

    for id in &ids {
        level_of(graph, id, &mut memo)?;
    }
    for (id, level) in &memo {
        if let Some(node) = graph.nodes.get_mut(id) {
            node.level = Some(*level);
        }
    }
    Ok(())
}

fn level_of(graph: &Graph, id: &str, memo: &mut HashMap<NodeId, u32>) -> Result<u32> {
    if let Some(level) = memo.get(id) {
        return Ok(*level);
    }
    let deps = graph.dependencies_of(id);
    let level = if deps.is_empty() {
        0
    } else {
        let mut max_dep_level = 0;
        for edge in deps {
            max_dep_level = max_dep_level.max(level_of(graph, &edge.to, memo)?);
        }
        1 + max_dep_level
    };
    memo.insert(id.to_string(), level);
    Ok(level)
}
