// Consumed interface: the external executor that turns a planned
// `DeploymentResource` into real infrastructure (§1 "the executor
// backend", §6 "Consumed interfaces"). Cloud provider drivers live outside
// this crate; this trait is the seam they plug into.

use crate::common::ComponentName;
use crate::planner::DeploymentResource;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Ambient identity passed to an executor call — the tenant session plus
/// whatever the executor backend needs to authenticate against the cloud
/// account (left opaque here; concrete executors downcast or extend it).
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub tenant_id: String,
    pub region: String,
}

/// Attributes observed on the cloud resource after a successful apply
/// (e.g. an ARN, an endpoint hostname) — merged into `State` on success.
pub type ActualAttributes = HashMap<String, JsonValue>;

/// Named outputs produced by a resource, consumed by later stages'
/// `${component.output}` interpolation (§4.3 step 5, §8 scenario 3).
pub type Outputs = HashMap<String, String>;

/// One executor call per `DeploymentResource`, dispatched by `ResourceAction`.
#[async_trait]
pub trait ResourceExecutor: Send + Sync {
    async fn apply(
        &self,
        resource: &DeploymentResource,
        auth: &AuthContext,
    ) -> Result<(ActualAttributes, Outputs)>;
}

/// Accumulates outputs across stages so that deferred `${component.output}`
/// references resolve once an earlier stage's executor results land
/// (§4.3 step 5(b), §8 scenario 3).
#[derive(Debug, Clone, Default)]
pub struct ComponentOutputs {
    outputs: HashMap<ComponentName, Outputs>,
}

impl ComponentOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, component: ComponentName, outputs: Outputs) {
        self.outputs.entry(component).or_default().extend(outputs);
    }

    pub fn resolve(&self, component: &str, output: &str) -> Option<&str> {
        self.outputs.get(component)?.get(output).map(String::as_str)
    }
}
