// Graph data model (§3 "Graph", §4.4).

use crate::parser::Resource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type NodeId = String;

/// Edge classification. `Explicit` comes from a component's `dependsOn`
/// list; `Implicit` from a resolved `env.valueFrom.component` reference
/// (§4.4). `Order` is reserved for a future purely-sequential hint with no
/// dependency semantics; nothing in this crate currently emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Explicit,
    Implicit,
    Order,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub edge_type: EdgeType,
}

/// One component in the graph. `level` and `in_degree` are `None`/unset
/// until `calculate_levels` runs; `in_degree` here counts outgoing
/// ("depends on") edges per §3's invariant (ii), not incoming ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: String,
    pub resource: Resource,
    pub declared_dependencies: Vec<NodeId>,
    pub level: Option<u32>,
    pub in_degree: usize,
}

/// Tri-colour DFS state, used only during cycle detection — not persisted
/// on `Node` (§3 "traversal flags" is an implementation detail here, kept
/// local to the algorithm that needs it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: HashMap<NodeId, Node>,
    pub edges: HashMap<NodeId, Vec<Edge>>,
    pub reverse_edges: HashMap<NodeId, Vec<Edge>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_ids_sorted(&self) -> Vec<&NodeId> {
        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort();
        ids
    }

    pub fn dependencies_of(&self, id: &str) -> &[Edge] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents_of(&self, id: &str) -> &[Edge] {
        self.reverse_edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}
