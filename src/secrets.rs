// Consumed interface: the cloud secrets-store client that holds the
// well-known admin credential (§6 "Consumed interfaces"). The concrete
// backend (e.g. a cloud secrets manager) is an external collaborator; this
// crate only depends on the trait.

use crate::Result;
use async_trait::async_trait;

/// Reads secrets by name from whatever secret-manager the deployment uses.
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Fetches a secret's current value, or `NotFound` if it does not exist.
    async fn get_secret(&self, name: &str) -> Result<String>;
}

/// Name of the well-known secret holding the bcrypt hash of the admin
/// password, read by `session::SessionManager::admin_login`.
pub const ADMIN_CREDENTIAL_SECRET_NAME: &str = "panka/admin-credential-hash";

/// In-memory secrets client for tests and local development.
#[derive(Debug, Default)]
pub struct InMemorySecretsClient {
    secrets: std::collections::HashMap<String, String>,
}

impl InMemorySecretsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretsClient for InMemorySecretsClient {
    async fn get_secret(&self, name: &str) -> Result<String> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| crate::error::PankaError::NotFound(format!("secret {name:?}")))
    }
}
