// Deployment Planner (C5, §4.5).

use super::model::{DeploymentPlan, DeploymentResource, ResourceAction, Stage};
use crate::error::PankaError;
use crate::graph::{Graph, NodeId, Sorter};
use crate::parser::UnresolvedReference;
use crate::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;

/// Per-kind duration estimates (§4.5 step 3). Anything not listed falls
/// back to `DEFAULT_DURATION_SECS`.
fn base_duration_secs(kind: &str) -> u64 {
    match kind {
        "S3" => 30,
        "SQS" | "SNS" => 20,
        "DynamoDB" => 45,
        "RDS" => 600,
        "MicroService" => 180,
        "ComponentInfra" => 120,
        _ => 30,
    }
}

pub struct Planner;

impl Planner {
    /// Builds a `DeploymentPlan` for `graph`, annotating each resource with
    /// the action the caller determined for it by diffing against current
    /// state. Ordering: if every actioned resource in the graph is a
    /// `Delete`, the whole plan groups by the reverse topological sort
    /// (leaves first, §4.5 step 1); otherwise the normal `sort_by_level`.
    /// Each resource's own duration estimate halves when its individual
    /// action is `Delete`, regardless of the plan's overall ordering mode.
    ///
    /// Refuses to build a plan while `unresolved_references` is non-empty:
    /// a `dependsOn`/`valueFrom.component` target that never resolved to a
    /// known component is non-fatal at parse time, but §5/§6 treat it as an
    /// error at plan time.
    pub fn plan(
        graph: &Graph,
        actions: &HashMap<NodeId, ResourceAction>,
        unresolved_references: &[UnresolvedReference],
    ) -> Result<DeploymentPlan> {
        if !unresolved_references.is_empty() {
            let detail = unresolved_references
                .iter()
                .map(|r| format!("{} -> {:?}", r.component, r.target))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(PankaError::Validation(format!(
                "cannot plan with unresolved dependency references: {detail}"
            )));
        }

        let is_bulk_delete = !graph.nodes.is_empty()
            && graph
                .nodes
                .keys()
                .all(|id| matches!(actions.get(id), Some(ResourceAction::Delete)));

        let buckets: Vec<Vec<NodeId>> = if is_bulk_delete {
            let order = Sorter::reverse_topological_sort(graph)?;
            group_reverse_order_by_level(graph, &order)
        } else {
            Sorter::sort_by_level(graph)
        };

        let mut stages = Vec::new();
        let mut number = 1u32;
        let mut total_resources = 0u32;
        let mut total_duration = Duration::from_secs(0);

        for bucket in buckets {
            if bucket.is_empty() {
                continue;
            }
            let level = graph.nodes[&bucket[0]].level.unwrap_or(0);

            let resources: Vec<DeploymentResource> = bucket
                .iter()
                .map(|id| {
                    let node = &graph.nodes[id];
                    let action = actions.get(id).copied().unwrap_or(ResourceAction::None);
                    DeploymentResource {
                        id: id.clone(),
                        kind: node.kind.clone(),
                        resource: node.resource.clone(),
                        dependencies: node.declared_dependencies.clone(),
                        action,
                    }
                })
                .collect();

            let stage_duration = resources
                .iter()
                .map(|r| {
                    let secs = base_duration_secs(&r.kind);
                    let secs = if r.action == ResourceAction::Delete {
                        secs / 2
                    } else {
                        secs
                    };
                    Duration::from_secs(secs)
                })
                .max()
                .unwrap_or(Duration::from_secs(0));

            total_resources += resources.len() as u32;
            total_duration += stage_duration;

            stages.push(Stage {
                number,
                level,
                resources,
            });
            number += 1;
        }

        Ok(DeploymentPlan {
            stack_name: String::new(),
            created_at: Utc::now(),
            total_stages: stages.len() as u32,
            total_resources,
            estimated_duration: total_duration,
            stages,
        })
    }

    /// Derives per-resource actions from a field-wise equality diff against
    /// the previous desired-config (§4.5 final paragraph): absent from
    /// state → `Create`; present in both but unequal → `Update`; in state
    /// but not declared → `Delete`; equal → `None`.
    pub fn diff_actions(
        declared: &HashMap<NodeId, serde_json::Value>,
        current: &HashMap<NodeId, serde_json::Value>,
    ) -> HashMap<NodeId, ResourceAction> {
        let mut actions = HashMap::new();
        for (id, desired) in declared {
            let action = match current.get(id) {
                None => ResourceAction::Create,
                Some(existing) if existing == desired => ResourceAction::None,
                Some(_) => ResourceAction::Update,
            };
            actions.insert(id.clone(), action);
        }
        for id in current.keys() {
            if !declared.contains_key(id) {
                actions.insert(id.clone(), ResourceAction::Delete);
            }
        }
        actions
    }

    /// `TotalStages == len(Stages)`; `TotalResources == sum(len(resources))`;
    /// stage numbers are exactly `1..TotalStages` in order (§4.5 Invariants).
    pub fn validate(plan: &DeploymentPlan) -> Result<()> {
        if plan.total_stages as usize != plan.stages.len() {
            return Err(PankaError::Validation(format!(
                "total_stages {} does not match {} stages",
                plan.total_stages,
                plan.stages.len()
            )));
        }
        let sum: usize = plan.stages.iter().map(|s| s.resources.len()).sum();
        if plan.total_resources as usize != sum {
            return Err(PankaError::Validation(format!(
                "total_resources {} does not match summed stage resources {sum}",
                plan.total_resources
            )));
        }
        for (expected, stage) in (1u32..).zip(&plan.stages) {
            if stage.number != expected {
                return Err(PankaError::Validation(format!(
                    "stage numbers are not a contiguous 1..N sequence: expected {expected}, found {}",
                    stage.number
                )));
            }
        }
        Ok(())
    }
}

/// Groups an already-reverse-topologically-sorted id list into per-level
/// buckets, preserving the reverse order of levels (highest level first)
/// so deletions remove dependents before their dependencies.
fn group_reverse_order_by_level(graph: &Graph, order: &[NodeId]) -> Vec<Vec<NodeId>> {
    let mut levels: Vec<u32> = order
        .iter()
        .map(|id| graph.nodes[id].level.unwrap_or(0))
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();
    levels.sort_unstable_by(|a, b| b.cmp(a));

    levels
        .into_iter()
        .map(|level| {
            let mut bucket: Vec<NodeId> = order
                .iter()
                .filter(|id| graph.nodes[id.as_str()].level.unwrap_or(0) == level)
                .cloned()
                .collect();
            bucket.sort();
            bucket
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Builder;
    use crate::parser::parse_stack;
    use std::fs;

    fn write(path: &std::path::Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn linear_graph() -> Graph {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("stack.yaml"), "apiVersion: panka/v1\nkind: Stack\nmetadata:\n  name: demo\n");
        write(&dir.path().join("services/api/a.yaml"), "apiVersion: panka/v1\nkind: S3\nmetadata:\n  name: bucket\n");
        write(&dir.path().join("services/api/b.yaml"), "apiVersion: panka/v1\nkind: MicroService\nmetadata:\n  name: api\nimage: x\ndependsOn: [\"bucket\"]\n");
        let parsed = parse_stack(dir.path(), None).unwrap();
        Builder::build(&parsed).unwrap()
    }

    #[test]
    fn create_plan_orders_by_level_ascending() {
        let graph = linear_graph();
        let mut actions = HashMap::new();
        actions.insert("bucket".to_string(), ResourceAction::Create);
        actions.insert("api".to_string(), ResourceAction::Create);

        let plan = Planner::plan(&graph, &actions, &[]).unwrap();
        Planner::validate(&plan).unwrap();
        assert_eq!(plan.total_stages, 2);
        assert_eq!(plan.total_resources, 2);
        assert_eq!(plan.stages[0].resources[0].id, "bucket");
        assert_eq!(plan.stages[1].resources[0].id, "api");
    }

    #[test]
    fn delete_plan_orders_dependents_first() {
        let graph = linear_graph();
        let mut actions = HashMap::new();
        actions.insert("bucket".to_string(), ResourceAction::Delete);
        actions.insert("api".to_string(), ResourceAction::Delete);

        let plan = Planner::plan(&graph, &actions, &[]).unwrap();
        Planner::validate(&plan).unwrap();
        assert_eq!(plan.stages[0].resources[0].id, "api");
        assert_eq!(plan.stages[1].resources[0].id, "bucket");
    }

    #[test]
    fn empty_graph_yields_zero_stage_plan() {
        let graph = Graph::default();
        let plan = Planner::plan(&graph, &HashMap::new(), &[]).unwrap();
        Planner::validate(&plan).unwrap();
        assert_eq!(plan.total_stages, 0);
        assert_eq!(plan.total_resources, 0);
    }

    #[test]
    fn duration_halves_for_deleted_resources() {
        let graph = linear_graph();
        let mut create_actions = HashMap::new();
        create_actions.insert("bucket".to_string(), ResourceAction::Create);
        create_actions.insert("api".to_string(), ResourceAction::None);
        let create_plan = Planner::plan(&graph, &create_actions, &[]).unwrap();

        let mut delete_actions = HashMap::new();
        delete_actions.insert("bucket".to_string(), ResourceAction::Delete);
        delete_actions.insert("api".to_string(), ResourceAction::Delete);
        let delete_plan = Planner::plan(&graph, &delete_actions, &[]).unwrap();

        assert!(delete_plan.estimated_duration < create_plan.estimated_duration);
    }

    #[test]
    fn diff_actions_classifies_create_update_delete_none() {
        let mut declared = HashMap::new();
        declared.insert("a".to_string(), serde_json::json!({"x": 1}));
        declared.insert("b".to_string(), serde_json::json!({"x": 1}));
        declared.insert("c".to_string(), serde_json::json!({"x": 1}));

        let mut current = HashMap::new();
        current.insert("a".to_string(), serde_json::json!({"x": 1}));
        current.insert("b".to_string(), serde_json::json!({"x": 2}));
        current.insert("d".to_string(), serde_json::json!({"x": 1}));

        let actions = Planner::diff_actions(&declared, &current);
        assert_eq!(actions.get("a"), Some(&ResourceAction::None));
        assert_eq!(actions.get("b"), Some(&ResourceAction::Update));
        assert_eq!(actions.get("c"), Some(&ResourceAction::Create));
        assert_eq!(actions.get("d"), Some(&ResourceAction::Delete));
    }

    #[test]
    fn lookups_find_stage_resource_and_kind() {
        let graph = linear_graph();
        let mut actions = HashMap::new();
        actions.insert("bucket".to_string(), ResourceAction::Create);
        actions.insert("api".to_string(), ResourceAction::Create);
        let plan = Planner::plan(&graph, &actions, &[]).unwrap();

        assert!(plan.get_stage_by_number(1).is_some());
        assert!(plan.get_stage_by_number(99).is_none());
        assert_eq!(plan.get_resource_by_id("api").unwrap().kind, "MicroService");
        assert_eq!(plan.get_resources_by_kind("S3").len(), 1);
    }
}
