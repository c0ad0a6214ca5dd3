// Sorter operations (§4.4 "Sorter operations").

use super::model::{Graph, NodeId};
use crate::error::PankaError;
use crate::Result;
use std::collections::{BTreeSet, HashMap};

pub struct Sorter;

impl Sorter {
    /// Kahn's algorithm on a clone of the dependency counts. When multiple
    /// nodes become ready simultaneously, pops them id-ascending for a
    /// deterministic, byte-for-byte-comparable order.
    pub fn topological_sort(graph: &Graph) -> Result<Vec<NodeId>> {
        let mut remaining: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .map(|(id, node)| (id.as_str(), node.in_degree))
            .collect();

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(graph.nodes.len());
        while let Some(id) = ready.iter().next().copied() {
            ready.remove(id);
            order.push(id.to_string());

            for edge in graph.dependents_of(id) {
                let count = remaining.get_mut(edge.from.as_str()).unwrap();
                *count -= 1;
                if *count == 0 {
                    ready.insert(edge.from.as_str());
                }
            }
        }

        if order.len() != graph.nodes.len() {
            return Err(PankaError::Validation(
                "cannot topologically sort a graph with a cycle".to_string(),
            ));
        }
        Ok(order)
    }

    pub fn reverse_topological_sort(graph: &Graph) -> Result<Vec<NodeId>> {
        let mut order = Self::topological_sort(graph)?;
        order.reverse();
        Ok(order)
    }

    /// Nodes grouped by `level`, ascending, each bucket id-sorted.
    pub fn sort_by_level(graph: &Graph) -> Vec<Vec<NodeId>> {
        let mut buckets: HashMap<u32, Vec<NodeId>> = HashMap::new();
        for id in graph.node_ids_sorted() {
            let level = graph.nodes[id].level.unwrap_or(0);
            buckets.entry(level).or_default().push(id.clone());
        }
        let mut levels: Vec<u32> = buckets.keys().copied().collect();
        levels.sort();
        levels
            .into_iter()
            .map(|level| {
                let mut bucket = buckets.remove(&level).unwrap();
                bucket.sort();
                bucket
            })
            .collect()
    }

    /// Splits any level bucket whose size exceeds `max_batch_size` into
    /// smaller id-ordered chunks.
    pub fn get_deployment_batches(graph: &Graph, max_batch_size: usize) -> Vec<Vec<NodeId>> {
        let max_batch_size = max_batch_size.max(1);
        Self::sort_by_level(graph)
            .into_iter()
            .flat_map(|bucket| {
                bucket
                    .chunks(max_batch_size)
                    .map(<[NodeId]>::to_vec)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Confirms every dependency appears before its dependent in `order`.
    pub fn validate_order(graph: &Graph, order: &[NodeId]) -> Result<()> {
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        for (id, node) in &graph.nodes {
            let Some(&pos) = position.get(id.as_str()) else {
                return Err(PankaError::Validation(format!(
                    "node {id:?} missing from order"
                )));
            };
            for dep in &node.declared_dependencies {
                let Some(&dep_pos) = position.get(dep.as_str()) else {
                    return Err(PankaError::Validation(format!(
                        "dependency {dep:?} of {id:?} missing from order"
                    )));
                };
                if dep_pos >= pos {
                    return Err(PankaError::Validation(format!(
                        "dependency {dep:?} does not precede dependent {id:?}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Traces back from the deepest-level node via the dependency with the
    /// highest level, ties broken by id ascending.
    pub fn get_critical_path(graph: &Graph) -> Vec<NodeId> {
        let Some(mut current) = graph
            .node_ids_sorted()
            .into_iter()
            .max_by_key(|id| (graph.nodes[id.as_str()].level.unwrap_or(0), std::cmp::Reverse((*id).clone())))
            .cloned()
        else {
            return Vec::new();
        };

        let mut path = vec![current.clone()];
        loop {
            let deps = graph.dependencies_of(&current);
            let next = deps
                .iter()
                .map(|e| &e.to)
                .max_by_key(|dep| (graph.nodes[dep.as_str()].level.unwrap_or(0), std::cmp::Reverse((*dep).clone())));
            match next {
                Some(next_id) => {
                    current = next_id.clone();
                    path.push(current.clone());
                }
                None => break,
            }
        }
        path
    }
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

    fn linear_graph() -> Graph {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("stack.yaml"),
            "apiVersion: panka/v1\nkind: Stack\nmetadata:\n  name: demo\n",
        );
        write(
            &dir.path().join("services/api/a.yaml"),
            "apiVersion: panka/v1\nkind: S3\nmetadata:\n  name: bucket\n",
        );
        write(
            &dir.path().join("services/api/b.yaml"),
            "apiVersion: panka/v1\nkind: MicroService\nmetadata:\n  name: api\nimage: x\ndependsOn: [\"bucket\"]\n",
        );
        write(
            &dir.path().join("services/api/c.yaml"),
            "apiVersion: panka/v1\nkind: Lambda\nmetadata:\n  name: worker\nruntime: x\nhandler: x\ndependsOn: [\"api\"]\n",
        );
        let parsed = parse_stack(dir.path(), None).unwrap();
        Builder::build(&parsed).unwrap()
    }

    #[test]
    fn topological_sort_respects_dependencies() {
        let graph = linear_graph();
        let order = Sorter::topological_sort(&graph).unwrap();
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("bucket") < pos("api"));
        assert!(pos("api") < pos("worker"));
    }

    #[test]
    fn reverse_topological_sort_is_exact_reverse() {
        let graph = linear_graph();
        let forward = Sorter::topological_sort(&graph).unwrap();
        let reverse = Sorter::reverse_topological_sort(&graph).unwrap();
        let mut expected = forward.clone();
        expected.reverse();
        assert_eq!(reverse, expected);
    }

    #[test]
    fn sort_by_level_groups_and_orders_by_id() {
        let graph = linear_graph();
        let levels = Sorter::sort_by_level(&graph);
        assert_eq!(levels, vec![vec!["bucket".to_string()], vec!["api".to_string()], vec!["worker".to_string()]]);
    }

    #[test]
    fn get_deployment_batches_splits_oversized_level() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("stack.yaml"),
            "apiVersion: panka/v1\nkind: Stack\nmetadata:\n  name: demo\n",
        );
        for n in 0..5 {
            write(
                &dir.path().join(format!("services/api/r{n}.yaml")),
                &format!("apiVersion: panka/v1\nkind: S3\nmetadata:\n  name: r{n}\n"),
            );
        }
        let parsed = parse_stack(dir.path(), None).unwrap();
        let graph = Builder::build(&parsed).unwrap();
        let batches = Sorter::get_deployment_batches(&graph, 2);
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() <= 2));
    }

    #[test]
    fn validate_order_accepts_topological_sort_output() {
        let graph = linear_graph();
        let order = Sorter::topological_sort(&graph).unwrap();
        assert!(Sorter::validate_order(&graph, &order).is_ok());
    }

    #[test]
    fn validate_order_rejects_backwards_order() {
        let graph = linear_graph();
        let bad = vec!["worker".to_string(), "api".to_string(), "bucket".to_string()];
        assert!(Sorter::validate_order(&graph, &bad).is_err());
    }

    #[test]
    fn critical_path_traces_deepest_chain() {
        let graph = linear_graph();
        let path = Sorter::get_critical_path(&graph);
        assert_eq!(path, vec!["worker".to_string(), "api".to_string(), "bucket".to_string()]);
    }

    #[test]
    fn cyclic_dependency_is_rejected_at_build_time() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("stack.yaml"),
            "apiVersion: panka/v1\nkind: Stack\nmetadata:\n  name: demo\n",
        );
        write(
            &dir.path().join("services/api/a.yaml"),
            "apiVersion: panka/v1\nkind: S3\nmetadata:\n  name: a\ndependsOn: [\"b\"]\n",
        );
        write(
            &dir.path().join("services/api/b.yaml"),
            "apiVersion: panka/v1\nkind: S3\nmetadata:\n  name: b\ndependsOn: [\"a\"]\n",
        );
        let parsed = parse_stack(dir.path(), None).unwrap();
        let err = Builder::build(&parsed).unwrap_err();
        assert!(matches!(err, PankaError::Validation(_)));
    }
}
