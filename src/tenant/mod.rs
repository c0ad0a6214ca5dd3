// Tenant Registry (C1, §4.1, §4.2 data model "Tenant").

pub mod model;
pub mod registry;

pub use model::{
    Limits, Networking, SecurityGroupRule, Subnet, Tenant, TenantPublicView, TenantRegistryDocument,
    TenantStatus,
};
pub use registry::{PlaintextSecret, TenantRegistry};
