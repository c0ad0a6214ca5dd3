// Stack/resource data model (§3 "Resource (declared)", §4.3).
//
// Every concrete component kind shares a `ComponentHeader`. `Resource` is
// the tagged union the graph builder (C4) and planner (C5) consume;
// `Stack`/`Service` are collection kinds, parsed for their variables but
// never turned into graph nodes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shared header on every resource document (apiVersion, kind, metadata).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub name: String,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

// Note: no `kind` field here — when flattened into a `Resource` variant
// struct, the kind is already supplied by the enum's internal tag. `kind`
// only appears as its own field on `StackHeader`/`ServiceHeader`, which are
// not part of the tagged union.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHeader {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub metadata: ResourceMetadata,
}

impl ComponentHeader {
    /// Fills `metadata.stack`/`metadata.service` from the enclosing folder
    /// when the document left them empty (§4.3 step 6).
    fn fill_scope(&mut self, stack: &str, service: Option<&str>) {
        if self.metadata.stack.is_none() {
            self.metadata.stack = Some(stack.to_string());
        }
        if self.metadata.service.is_none() {
            if let Some(s) = service {
                self.metadata.service = Some(s.to_string());
            }
        }
    }
}

/// A reference to another component's named output, used by `env.valueFrom`
/// (§4.4 implicit edges) and resolved by the executor at runtime (§4.3 step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueFrom {
    pub component: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Plain(String),
    ValueFrom {
        #[serde(rename = "valueFrom")]
        value_from: ValueFrom,
    },
}

macro_rules! component_spec {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $name {
            #[serde(flatten)]
            pub header: ComponentHeader,
            #[serde(default, rename = "dependsOn")]
            pub depends_on: Vec<String>,
            $(pub $field: $ty,)*
        }
    };
}

component_spec!(MicroServiceSpec {
    image: String,
    #[serde(default)]
    replicas: Option<u32>,
    #[serde(default)]
    env: HashMap<String, EnvValue>
});

component_spec!(LambdaSpec {
    runtime: String,
    handler: String,
    #[serde(default)]
    memory_mb: Option<u32>,
    #[serde(default)]
    env: HashMap<String, EnvValue>
});

component_spec!(RdsSpec {
    engine: String,
    #[serde(default)]
    instance_class: Option<String>,
    #[serde(default)]
    allocated_storage_gb: Option<u32>
});

component_spec!(DynamoDbSpec {
    #[serde(default)]
    partition_key: Option<String>,
    #[serde(default)]
    sort_key: Option<String>,
    #[serde(default)]
    billing_mode: Option<String>
});

component_spec!(S3Spec {
    #[serde(default)]
    versioning: bool,
    #[serde(default)]
    public_access_block: bool
});

component_spec!(SqsSpec {
    #[serde(default)]
    fifo: bool,
    #[serde(default)]
    visibility_timeout_seconds: Option<u32>
});

component_spec!(SnsSpec {
    #[serde(default)]
    fifo: bool
});

component_spec!(ComponentInfraSpec {
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    parameters: HashMap<String, serde_yaml::Value>
});

/// The tagged union over declared component kinds (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Resource {
    MicroService(MicroServiceSpec),
    Lambda(LambdaSpec),
    RDS(RdsSpec),
    DynamoDB(DynamoDbSpec),
    S3(S3Spec),
    SQS(SqsSpec),
    SNS(SnsSpec),
    ComponentInfra(ComponentInfraSpec),
}

impl Resource {
    pub fn header(&self) -> &ComponentHeader {
        match self {
            Resource::MicroService(s) => &s.header,
            Resource::Lambda(s) => &s.header,
            Resource::RDS(s) => &s.header,
            Resource::DynamoDB(s) => &s.header,
            Resource::S3(s) => &s.header,
            Resource::SQS(s) => &s.header,
            Resource::SNS(s) => &s.header,
            Resource::ComponentInfra(s) => &s.header,
        }
    }

    fn header_mut(&mut self) -> &mut ComponentHeader {
        match self {
            Resource::MicroService(s) => &mut s.header,
            Resource::Lambda(s) => &mut s.header,
            Resource::RDS(s) => &mut s.header,
            Resource::DynamoDB(s) => &mut s.header,
            Resource::S3(s) => &mut s.header,
            Resource::SQS(s) => &mut s.header,
            Resource::SNS(s) => &mut s.header,
            Resource::ComponentInfra(s) => &mut s.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().metadata.name
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Resource::MicroService(_) => "MicroService",
            Resource::Lambda(_) => "Lambda",
            Resource::RDS(_) => "RDS",
            Resource::DynamoDB(_) => "DynamoDB",
            Resource::S3(_) => "S3",
            Resource::SQS(_) => "SQS",
            Resource::SNS(_) => "SNS",
            Resource::ComponentInfra(_) => "ComponentInfra",
        }
    }

    pub fn depends_on(&self) -> &[String] {
        match self {
            Resource::MicroService(s) => &s.depends_on,
            Resource::Lambda(s) => &s.depends_on,
            Resource::RDS(s) => &s.depends_on,
            Resource::DynamoDB(s) => &s.depends_on,
            Resource::S3(s) => &s.depends_on,
            Resource::SQS(s) => &s.depends_on,
            Resource::SNS(s) => &s.depends_on,
            Resource::ComponentInfra(s) => &s.depends_on,
        }
    }

    /// Implicit dependencies via `env.valueFrom.component` (MicroService
    /// only, §4.4).
    pub fn implicit_dependencies(&self) -> Vec<String> {
        let env = match self {
            Resource::MicroService(s) => &s.env,
            _ => return Vec::new(),
        };
        env.values()
            .filter_map(|v| match v {
                EnvValue::ValueFrom { value_from } => Some(value_from.component.clone()),
                EnvValue::Plain(_) => None,
            })
            .collect()
    }

    pub(crate) fn fill_scope(&mut self, stack: &str, service: Option<&str>) {
        self.header_mut().fill_scope(stack, service);
    }
}

/// `stack.yaml` — stack-level header plus free-form variables (§4.3 step 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackHeader {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ResourceMetadata,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// `service.yaml` — service-level header plus free-form variables
/// (§4.3 step 4). Synthesized with defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHeader {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ResourceMetadata,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

impl ServiceHeader {
    pub fn synthesized(name: &str, stack: &str) -> Self {
        Self {
            api_version: "panka/v1".to_string(),
            kind: "Service".to_string(),
            metadata: ResourceMetadata {
                name: name.to_string(),
                tenant: None,
                stack: Some(stack.to_string()),
                service: Some(name.to_string()),
                labels: HashMap::new(),
                annotations: HashMap::new(),
            },
            variables: HashMap::new(),
        }
    }
}

/// The parsed contents of one `services/<svc>/` directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceParseResult {
    pub header: ServiceHeader,
    pub components: Vec<Resource>,
    /// Raw bytes of every file under `config/`, keyed by filename.
    pub config_files: HashMap<String, Vec<u8>>,
}

/// Tenant networking, attached to the parse result when the caller supplies
/// it (§4.3 step 8).
pub use crate::tenant::Networking as TenantNetworking;

/// One `dependsOn`/`valueFrom.component` reference that didn't resolve to a
/// known component name (§4.3 step 7). Parsing itself treats this as
/// non-fatal, but §5/§6 require planning to refuse to proceed while any of
/// these remain (see `planner::Planner::plan`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub component: String,
    pub target: String,
}

/// The product of C3 (§3 "Stack parse result", §4.3 "Observable outputs").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackParseResult {
    pub stack: StackHeader,
    pub services: HashMap<String, ServiceParseResult>,
    pub components: Vec<Resource>,
    pub tenant_networking: Option<TenantNetworking>,
    pub stack_path: String,
    pub warnings: Vec<String>,
    pub unresolved_references: Vec<UnresolvedReference>,
}

impl StackParseResult {
    pub fn component_names(&self) -> std::collections::HashSet<&str> {
        self.components.iter().map(Resource::name).collect()
    }
}
