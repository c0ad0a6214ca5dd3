// Session data model (§3 "Session", §6 "Session file").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Admin,
    Tenant,
}

/// The ambient authority passed to C3-C7 when they need tenant scope.
/// Any field absent on disk is treated as "no session" (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub mode: SessionMode,
    pub bucket: String,
    pub region: String,
    /// Present only in tenant mode.
    pub tenant: Option<String>,
    pub authenticated: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires
    }

    /// A tenant session must never be usable against any other tenant's
    /// prefix or lock key (§4.2).
    pub fn authorizes_tenant(&self, tenant_id: &str) -> bool {
        match self.mode {
            SessionMode::Admin => true,
            SessionMode::Tenant => self.tenant.as_deref() == Some(tenant_id),
        }
    }
}
