// Deployment plan data model (§3 "DeploymentPlan", §4.5).

use crate::graph::NodeId;
use crate::parser::Resource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the planner decided to do with a resource, derived by the caller
/// from a diff against current state (§4.5's final paragraph) and passed
/// in per-resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    Create,
    Update,
    Delete,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResource {
    pub id: NodeId,
    pub kind: String,
    pub resource: Resource,
    pub dependencies: Vec<NodeId>,
    pub action: ResourceAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub number: u32,
    pub level: u32,
    pub resources: Vec<DeploymentResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub stack_name: String,
    pub created_at: DateTime<Utc>,
    pub stages: Vec<Stage>,
    pub total_stages: u32,
    pub total_resources: u32,
    pub estimated_duration: std::time::Duration,
}

impl DeploymentPlan {
    pub fn get_stage_by_number(&self, number: u32) -> Option<&Stage> {
        self.stages.iter().find(|s| s.number == number)
    }

    pub fn get_resource_by_id(&self, id: &str) -> Option<&DeploymentResource> {
        self.stages
            .iter()
            .flat_map(|s| &s.resources)
            .find(|r| r.id == id)
    }

    pub fn get_resources_by_kind(&self, kind: &str) -> Vec<&DeploymentResource> {
        self.stages
            .iter()
            .flat_map(|s| &s.resources)
            .filter(|r| r.kind == kind)
            .collect()
    }
}
