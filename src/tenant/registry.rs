// Tenant Registry (C1, §4.1).
//
// Holds two object classes in the shared state bucket: the global
// `tenants.yaml` document (all tenants' public metadata + credential
// hashes) and one per-tenant `tenants/{id}/tenant.yaml` document
// (networking + limits). All admin operations are read-modify-write on the
// global document, serialized by an implicit admin lock — optimistic
// overwrite is acceptable at admin throughput.

use super::model::{Limits, Networking, Tenant, TenantPublicView, TenantRegistryDocument, TenantStatus};
use crate::common::TenantId;
use crate::error::PankaError;
use crate::Result;
use bcrypt::{hash, verify};
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

const REGISTRY_KEY: &str = "tenants.yaml";
const BCRYPT_COST: u32 = 10;

/// Plaintext tenant secret generated on `create_tenant` / `rotate`. Never
/// persisted — only its bcrypt hash is written to the registry.
pub struct PlaintextSecret(pub String);

pub struct TenantRegistry {
    store: Arc<dyn ObjectStore>,
}

impl TenantRegistry {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    async fn load_document(&self) -> Result<TenantRegistryDocument> {
        let path = ObjectPath::from(REGISTRY_KEY);
        match self.store.get(&path).await {
            Ok(result) => {
                let bytes = result
                    .bytes()
                    .await
                    .map_err(|e| PankaError::BackendTransient(e.to_string()))?;
                serde_yaml::from_slice(&bytes)
                    .map_err(|e| PankaError::SerializationError(e.to_string()))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(TenantRegistryDocument::default()),
            Err(e) => Err(PankaError::BackendTransient(e.to_string())),
        }
    }

    async fn save_document(&self, doc: &TenantRegistryDocument) -> Result<()> {
        let path = ObjectPath::from(REGISTRY_KEY);
        let bytes = serde_yaml::to_string(doc)
            .map_err(|e| PankaError::SerializationError(e.to_string()))?;
        self.store
            .put(&path, bytes.into_bytes().into())
            .await
            .map_err(|e| PankaError::BackendTransient(e.to_string()))?;
        Ok(())
    }

    async fn save_tenant_document(&self, tenant: &Tenant) -> Result<()> {
        let path = ObjectPath::from(format!("tenants/{}/tenant.yaml", tenant.id));
        let bytes = serde_yaml::to_string(tenant)
            .map_err(|e| PankaError::SerializationError(e.to_string()))?;
        self.store
            .put(&path, bytes.into_bytes().into())
            .await
            .map_err(|e| PankaError::BackendTransient(e.to_string()))?;
        Ok(())
    }

    fn generate_secret() -> PlaintextSecret {
        let random: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        PlaintextSecret(format!("pnk_{random}"))
    }

    /// Creates a tenant, returning its id and the one-time plaintext
    /// secret. Fails with `AlreadyExists` if `id` collides.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_tenant(
        &self,
        id: TenantId,
        display_name: String,
        contact_email: String,
        aws_account: String,
        region: String,
        networking: Networking,
        limits: Limits,
    ) -> Result<(TenantId, PlaintextSecret)> {
        let mut doc = self.load_document().await?;
        if doc.tenants.contains_key(&id) {
            return Err(PankaError::AlreadyExists(format!("tenant {id:?}")));
        }

        let secret = Self::generate_secret();
        let credential_hash = hash(&secret.0, BCRYPT_COST)
            .map_err(|e| PankaError::Internal(format!("bcrypt hash failed: {e}")))?;

        let tenant = Tenant {
            id: id.clone(),
            display_name,
            contact_email,
            aws_account,
            region,
            networking,
            limits,
            default_tags: HashMap::new(),
            allowed_resource_kinds: HashSet::new(),
            credential_hash,
            rotation_counter: 0,
            status: TenantStatus::Active,
            created_at: chrono::Utc::now(),
        };

        self.save_tenant_document(&tenant).await?;
        doc.tenants.insert(id.clone(), tenant);
        self.save_document(&doc).await?;

        info!(tenant = %id, "tenant created");
        Ok((id, secret))
    }

    pub async fn list_tenants(&self) -> Result<Vec<TenantPublicView>> {
        let doc = self.load_document().await?;
        let mut views: Vec<TenantPublicView> = doc.tenants.values().map(TenantPublicView::from).collect();
        views.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(views)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Tenant> {
        let doc = self.load_document().await?;
        doc.tenants
            .get(id)
            .cloned()
            .ok_or_else(|| PankaError::NotFound(format!("tenant {id:?}")))
    }

    /// Bumps the rotation counter and issues a fresh secret. Old sessions
    /// remain filesystem-valid until their own expiry but will fail
    /// re-authentication since the stored hash changes.
    pub async fn rotate(&self, id: &str) -> Result<PlaintextSecret> {
        let mut doc = self.load_document().await?;
        let tenant = doc
            .tenants
            .get_mut(id)
            .ok_or_else(|| PankaError::NotFound(format!("tenant {id:?}")))?;

        let secret = Self::generate_secret();
        tenant.credential_hash = hash(&secret.0, BCRYPT_COST)
            .map_err(|e| PankaError::Internal(format!("bcrypt hash failed: {e}")))?;
        tenant.rotation_counter += 1;

        self.save_tenant_document(tenant).await?;
        self.save_document(&doc).await?;
        info!(tenant = %id, "tenant secret rotated");
        Ok(secret)
    }

    pub async fn suspend(&self, id: &str) -> Result<()> {
        self.set_status(id, TenantStatus::Suspended).await
    }

    pub async fn activate(&self, id: &str) -> Result<()> {
        self.set_status(id, TenantStatus::Active).await
    }

    async fn set_status(&self, id: &str, status: TenantStatus) -> Result<()> {
        let mut doc = self.load_document().await?;
        let tenant = doc
            .tenants
            .get_mut(id)
            .ok_or_else(|| PankaError::NotFound(format!("tenant {id:?}")))?;
        tenant.status = status;
        self.save_tenant_document(tenant).await?;
        self.save_document(&doc).await?;
        Ok(())
    }

    /// Removes the registry entry. The per-tenant state prefix is left
    /// intact — whether to also delete it is an operator policy decision
    /// deferred by this spec (§9 open question a).
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut doc = self.load_document().await?;
        if doc.tenants.remove(id).is_none() {
            return Err(PankaError::NotFound(format!("tenant {id:?}")));
        }
        self.save_document(&doc).await?;
        warn!(tenant = %id, "tenant removed from registry; state prefix left intact");
        Ok(())
    }

    /// Verifies a tenant secret against the stored hash. Returns the same
    /// `AuthFailure` for "no such tenant" and "bad secret" so authentication
    /// paths never leak tenant existence (§4.1 Failure semantics).
    pub async fn authenticate(&self, id: &str, candidate_secret: &str) -> Result<Tenant> {
        let doc = self.load_document().await?;
        let tenant = match doc.tenants.get(id) {
            Some(t) => t,
            None => return Err(PankaError::AuthFailure),
        };
        if tenant.status == TenantStatus::Suspended {
            return Err(PankaError::AuthFailure);
        }
        let ok = verify(candidate_secret, &tenant.credential_hash)
            .map_err(|e| PankaError::Internal(format!("bcrypt verify failed: {e}")))?;
        if !ok {
            return Err(PankaError::AuthFailure);
        }
        Ok(tenant.clone())
    }
}
