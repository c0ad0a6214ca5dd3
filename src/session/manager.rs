// Session Manager (C2, §4.2).
//
// Authenticates admin/tenant and persists a process-local session file at
// `{home}/.panka/session`, mode 0600. The session is the ambient authority
// passed to C3-C7 when they need tenant scope.

use super::model::{Session, SessionMode};
use crate::error::PankaError;
use crate::secrets::{SecretsClient, ADMIN_CREDENTIAL_SECRET_NAME};
use crate::tenant::TenantRegistry;
use crate::Result;
use bcrypt::verify;
use chrono::{Duration as ChronoDuration, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const ADMIN_SESSION_TTL_HOURS: i64 = 8;
const TENANT_SESSION_TTL_DAYS: i64 = 7;

pub struct SessionManager {
    secrets: Arc<dyn SecretsClient>,
    tenants: Arc<TenantRegistry>,
    session_dir: PathBuf,
}

impl SessionManager {
    pub fn new(secrets: Arc<dyn SecretsClient>, tenants: Arc<TenantRegistry>, home: &Path) -> Self {
        Self { secrets, tenants, session_dir: home.join(".panka") }
    }

    fn session_path(&self) -> PathBuf {
        self.session_dir.join("session")
    }

    pub async fn admin_login(&self, bucket: String, region: String, password: &str) -> Result<Session> {
        let stored_hash = self.secrets.get_secret(ADMIN_CREDENTIAL_SECRET_NAME).await?;
        let ok = verify(password, &stored_hash)
            .map_err(|e| PankaError::Internal(format!("bcrypt verify failed: {e}")))?;
        if !ok {
            return Err(PankaError::AuthFailure);
        }

        let now = Utc::now();
        let session = Session {
            mode: SessionMode::Admin,
            bucket,
            region,
            tenant: None,
            authenticated: now,
            expires: now + ChronoDuration::hours(ADMIN_SESSION_TTL_HOURS),
        };
        self.write_session(&session)?;
        info!("admin session created");
        Ok(session)
    }

    pub async fn tenant_login(&self, bucket: String, region: String, tenant_id: &str, secret: &str) -> Result<Session> {
        let tenant = self.tenants.authenticate(tenant_id, secret).await?;

        let now = Utc::now();
        let session = Session {
            mode: SessionMode::Tenant,
            bucket,
            region,
            tenant: Some(tenant.id.clone()),
            authenticated: now,
            expires: now + ChronoDuration::days(TENANT_SESSION_TTL_DAYS),
        };
        self.write_session(&session)?;
        info!(tenant = %tenant.id, "tenant session created");
        Ok(session)
    }

    pub fn load_session(&self) -> Result<Session> {
        let path = self.session_path();
        if !path.is_file() {
            return Err(PankaError::NotFound("no session file".to_string()));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path)?.permissions().mode();
            if mode & 0o077 != 0 {
                warn!(path = %path.display(), mode = format!("{mode:o}"), "session file has loose permissions");
            }
        }

        let raw = std::fs::read_to_string(&path)?;
        let session: Session = serde_yaml::from_str(&raw)
            .map_err(|_| PankaError::NotFound("no session file".to_string()))?;

        if session.is_expired() {
            return Err(PankaError::Expired(session.expires.to_rfc3339()));
        }
        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        let path = self.session_path();
        if path.is_file() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn write_session(&self, session: &Session) -> Result<()> {
        std::fs::create_dir_all(&self.session_dir)?;
        let path = self.session_path();
        let raw = serde_yaml::to_string(session)
            .map_err(|e| PankaError::SerializationError(e.to_string()))?;
        std::fs::write(&path, raw)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::InMemorySecretsClient;
    use crate::tenant::{Limits, Networking};
    use object_store::memory::InMemory;

    fn admin_secrets(hash: &str) -> Arc<dyn SecretsClient> {
        Arc::new(InMemorySecretsClient::new().with_secret(ADMIN_CREDENTIAL_SECRET_NAME, hash))
    }

    #[tokio::test]
    async fn admin_login_writes_session_with_0600_perms() {
        let hash = bcrypt::hash("swordfish", 4).unwrap();
        let tenants = Arc::new(TenantRegistry::new(Arc::new(InMemory::new())));
        let home = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new(admin_secrets(&hash), tenants, home.path());

        let session = mgr.admin_login("bucket".into(), "us-east-1".into(), "swordfish").await.unwrap();
        assert_eq!(session.mode, SessionMode::Admin);

        let loaded = mgr.load_session().unwrap();
        assert_eq!(loaded.bucket, "bucket");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(home.path().join(".panka/session")).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn admin_login_rejects_bad_password() {
        let hash = bcrypt::hash("swordfish", 4).unwrap();
        let tenants = Arc::new(TenantRegistry::new(Arc::new(InMemory::new())));
        let home = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new(admin_secrets(&hash), tenants, home.path());

        let result = mgr.admin_login("bucket".into(), "us-east-1".into(), "wrong").await;
        assert!(matches!(result, Err(PankaError::AuthFailure)));
    }

    #[tokio::test]
    async fn tenant_login_then_load_round_trips() {
        let tenant_store = Arc::new(TenantRegistry::new(Arc::new(InMemory::new())));
        let (id, secret) = tenant_store
            .create_tenant(
                "acme".into(),
                "Acme".into(),
                "a@acme.test".into(),
                "1".into(),
                "us-east-1".into(),
                Networking::default(),
                Limits::default(),
            )
            .await
            .unwrap();

        let home = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new(admin_secrets("unused"), tenant_store, home.path());
        let session = mgr.tenant_login("bucket".into(), "us-east-1".into(), &id, &secret.0).await.unwrap();
        assert_eq!(session.tenant.as_deref(), Some("acme"));
        assert!(session.authorizes_tenant("acme"));
        assert!(!session.authorizes_tenant("other"));

        mgr.logout().unwrap();
        assert!(mgr.load_session().is_err());
    }
}
