// Lock data model (§3 "Lock", §4.7 "Lock record fields").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The persisted record, keyed by `lock_key` in the backend (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub lock_key: String,
    pub lock_id: String,
    pub locked_by: String,
    pub locked_at: i64,
    pub expires_at: i64,
    pub last_heartbeat: i64,
    pub metadata: HashMap<String, String>,
}

/// The read-only view returned by `get_lock`/`list_locks`, annotated with
/// the staleness heuristic (§4.7 "Stale heuristic").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub lock_key: String,
    pub lock_id: String,
    pub locked_by: String,
    pub locked_at: i64,
    pub expires_at: i64,
    pub last_heartbeat: i64,
    pub metadata: HashMap<String, String>,
    pub is_stale: bool,
}

impl LockInfo {
    pub fn from_record(record: &LockRecord, now: i64, heartbeat_interval_secs: i64) -> Self {
        Self {
            lock_key: record.lock_key.clone(),
            lock_id: record.lock_id.clone(),
            locked_by: record.locked_by.clone(),
            locked_at: record.locked_at,
            expires_at: record.expires_at,
            last_heartbeat: record.last_heartbeat,
            metadata: record.metadata.clone(),
            is_stale: now - record.last_heartbeat > 2 * heartbeat_interval_secs,
        }
    }
}

/// Builds the lock keys named in §3 ("Lock"): stack-level default,
/// service- and component-scoped variants.
pub fn stack_lock_key(tenant: &str, stack: &str, env: &str) -> String {
    format!("tenant:{tenant}:stack:{stack}:env:{env}")
}

pub fn service_lock_key(tenant: &str, stack: &str, env: &str, service: &str) -> String {
    format!("{}:service:{service}", stack_lock_key(tenant, stack, env))
}

pub fn component_lock_key(
    tenant: &str,
    stack: &str,
    env: &str,
    service: &str,
    component: &str,
) -> String {
    format!("{}/{component}", service_lock_key(tenant, stack, env, service))
}
