// State data model (§3 "State (persisted)").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMetadata {
    pub stack: String,
    pub environment: String,
    pub deployed_at: DateTime<Utc>,
    pub deployed_by: String,
    pub deployment_id: String,
    pub git_commit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StateNetworking {
    pub vpc_id: Option<String>,
    pub subnet_ids: Vec<String>,
    pub security_group_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceHealth {
    Healthy,
    Degraded,
    Unknown,
}

/// One entry of `state.resources`, keyed by component name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResourceState {
    pub kind: String,
    pub status: String,
    pub physical_id: Option<String>,
    pub desired_config: JsonValue,
    pub actual_attributes: HashMap<String, JsonValue>,
    pub outputs: HashMap<String, String>,
    pub dependencies: Vec<String>,
    pub health: Option<ResourceHealth>,
    pub backend_info: HashMap<String, JsonValue>,
}

impl Default for ResourceHealth {
    fn default() -> Self {
        ResourceHealth::Unknown
    }
}

/// The canonical per-(tenant, stack, environment) document (§3, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub version: u32,
    pub metadata: StateMetadata,
    #[serde(default)]
    pub networking: Option<StateNetworking>,
    #[serde(default)]
    pub resources: HashMap<String, ResourceState>,
    #[serde(default)]
    pub outputs: HashMap<String, String>,
    #[serde(default)]
    pub deployment_history: Vec<Deployment>,
}

/// A bounded history entry retained inline on `State.deployment_history`,
/// separate from the append-only snapshot objects under `history/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub deployment_id: String,
    pub deployed_at: DateTime<Utc>,
    pub deployed_by: String,
    pub git_commit: Option<String>,
    pub resource_count: usize,
}

/// Number of inline history entries `save` retains on `State` before
/// trimming the oldest (the append-only `history/` prefix is unbounded;
/// this bound is only for the inline convenience list).
pub const MAX_INLINE_HISTORY: usize = 50;

impl State {
    pub fn new(stack: String, environment: String, deployed_by: String, deployment_id: String) -> Self {
        Self {
            version: 1,
            metadata: StateMetadata {
                stack,
                environment,
                deployed_at: Utc::now(),
                deployed_by,
                deployment_id,
                git_commit: None,
            },
            networking: None,
            resources: HashMap::new(),
            outputs: HashMap::new(),
            deployment_history: Vec::new(),
        }
    }

    /// Appends the inline history entry derived from this save and trims
    /// to `MAX_INLINE_HISTORY`.
    pub fn record_deployment(&mut self) {
        let entry = Deployment {
            deployment_id: self.metadata.deployment_id.clone(),
            deployed_at: self.metadata.deployed_at,
            deployed_by: self.metadata.deployed_by.clone(),
            git_commit: self.metadata.git_commit.clone(),
            resource_count: self.resources.len(),
        };
        self.deployment_history.push(entry);
        if self.deployment_history.len() > MAX_INLINE_HISTORY {
            let overflow = self.deployment_history.len() - MAX_INLINE_HISTORY;
            self.deployment_history.drain(0..overflow);
        }
    }
}
