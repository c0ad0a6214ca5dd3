// Tenant data model (§3 "Tenant").

use crate::common::TenantId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Operational status of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Suspended,
}

/// A subnet declaration within a tenant's VPC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subnet {
    pub cidr: String,
    pub availability_zone: String,
}

/// A single security-group rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityGroupRule {
    pub protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    pub cidr: String,
}

/// Tenant-scoped VPC networking block (§3 "networking block").
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Networking {
    pub vpc_cidr: String,
    pub public_subnets: Vec<Subnet>,
    pub private_subnets: Vec<Subnet>,
    pub nat_gateway_enabled: bool,
    pub default_ingress: Vec<SecurityGroupRule>,
    pub default_egress: Vec<SecurityGroupRule>,
}

/// Per-tenant resource ceilings (§3 "limits").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Limits {
    pub max_stacks: u32,
    pub max_services_per_stack: u32,
    pub max_resources_per_service: u32,
    pub monthly_cost_cap_usd: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_stacks: crate::common::DEFAULT_MAX_STACKS,
            max_services_per_stack: crate::common::DEFAULT_MAX_SERVICES_PER_STACK,
            max_resources_per_service: crate::common::DEFAULT_MAX_RESOURCES_PER_SERVICE,
            monthly_cost_cap_usd: 10_000,
        }
    }
}

/// Resource kinds a tenant is permitted to declare, mirroring the
/// `Resource` tagged variants of §3 without depending on the parser crate
/// (kept as plain strings so the registry has no dependency on `parser`).
pub type ResourceKind = String;

/// Full tenant record as stored at `tenants/{id}/tenant.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub display_name: String,
    pub contact_email: String,
    pub aws_account: String,
    pub region: String,
    pub networking: Networking,
    pub limits: Limits,
    pub default_tags: HashMap<String, String>,
    pub allowed_resource_kinds: HashSet<ResourceKind>,
    /// bcrypt hash of the tenant secret; never the plaintext.
    pub credential_hash: String,
    pub rotation_counter: u32,
    pub status: TenantStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Public view of a tenant — returned by `list_tenants` / `find_by_id`,
/// never carries `credential_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantPublicView {
    pub id: TenantId,
    pub display_name: String,
    pub contact_email: String,
    pub aws_account: String,
    pub region: String,
    pub status: TenantStatus,
    pub rotation_counter: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Tenant> for TenantPublicView {
    fn from(t: &Tenant) -> Self {
        Self {
            id: t.id.clone(),
            display_name: t.display_name.clone(),
            contact_email: t.contact_email.clone(),
            aws_account: t.aws_account.clone(),
            region: t.region.clone(),
            status: t.status,
            rotation_counter: t.rotation_counter,
            created_at: t.created_at,
        }
    }
}

/// The global registry document at `tenants.yaml`: one entry per tenant,
/// holding public metadata plus the credential hash (admin-only view).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TenantRegistryDocument {
    pub tenants: HashMap<TenantId, Tenant>,
}
