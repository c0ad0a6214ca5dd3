// # Common Types
//
// Shared identifiers and collection limits used across the tenant, session,
// parser, graph, planner, state, and lock modules. Keeps inter-module
// contracts in one place the way the rest of the core is organized by
// component.

// ============================================================================
// Shared Identifiers
// ============================================================================

/// Slug-like tenant identifier, unique in the registry.
pub type TenantId = String;

/// Name of a stack folder.
pub type StackName = String;

/// Name of a service subdirectory within a stack.
pub type ServiceName = String;

/// Name of a component within a service (unique per (tenant, stack)).
pub type ComponentName = String;

/// Deployment environment name (e.g. "production", "staging").
pub type EnvName = String;

// ============================================================================
// Collection limits — bound what a single parse/plan can hold in memory
// ============================================================================

/// Maximum stacks a tenant may declare (enforced by Tenant::limits, not here).
pub const DEFAULT_MAX_STACKS: u32 = 50;

/// Maximum services per stack (enforced by Tenant::limits, not here).
pub const DEFAULT_MAX_SERVICES_PER_STACK: u32 = 50;

/// Maximum resources per service (enforced by Tenant::limits, not here).
pub const DEFAULT_MAX_RESOURCES_PER_SERVICE: u32 = 100;

/// Returns a RFC3339 timestamp truncated to the second, used for history
/// snapshot keys in the state store (§4.6) and session expiry checks.
pub fn now_iso_seconds() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_timestamp_has_seconds_precision() {
        let ts = now_iso_seconds();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-01-01T00:00:00Z".len());
    }
}
