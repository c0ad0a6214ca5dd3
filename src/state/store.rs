// State Store (C6, §4.6).
//
// One object store instance, one authorization check per call. Every
// operation takes the caller's `Session` first and refuses to build a key
// outside `tenants/{T}/...` for that session's tenant — the isolation
// invariant lives here, not upstream, as defence in depth relative to
// whatever identity-layer policy already ran.

use super::model::{Deployment, State};
use crate::common::now_iso_seconds;
use crate::error::PankaError;
use crate::session::Session;
use crate::Result;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::{info, warn};

fn state_key(tenant: &str, stack: &str, env: &str) -> String {
    format!(
        "tenants/{tenant}/v{}/stacks/{stack}/{env}/state.json",
        crate::STORAGE_FORMAT_VERSION
    )
}

fn history_prefix(tenant: &str, stack: &str, env: &str) -> String {
    format!(
        "tenants/{tenant}/v{}/stacks/{stack}/{env}/history/",
        crate::STORAGE_FORMAT_VERSION
    )
}

fn history_key(tenant: &str, stack: &str, env: &str, timestamp: &str) -> String {
    format!("{}{timestamp}.json", history_prefix(tenant, stack, env))
}

pub struct StateStore {
    store: Arc<dyn ObjectStore>,
}

impl StateStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    fn check_isolation(session: &Session, tenant: &str) -> Result<()> {
        if !session.authorizes_tenant(tenant) {
            return Err(PankaError::Forbidden(format!(
                "session is not authorized for tenant {tenant:?}"
            )));
        }
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = ObjectPath::from(key);
        match self.store.get(&path).await {
            Ok(result) => {
                let bytes = result
                    .bytes()
                    .await
                    .map_err(|e| PankaError::BackendTransient(e.to_string()))?;
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| PankaError::SerializationError(e.to_string()))?;
                Ok(Some(value))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(PankaError::BackendTransient(e.to_string())),
        }
    }

    async fn put_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = ObjectPath::from(key);
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| PankaError::SerializationError(e.to_string()))?;
        self.store
            .put(&path, bytes.into())
            .await
            .map_err(|e| PankaError::BackendTransient(e.to_string()))?;
        Ok(())
    }

    pub async fn load(&self, session: &Session, tenant: &str, stack: &str, env: &str) -> Result<State> {
        Self::check_isolation(session, tenant)?;
        self.get_json(&state_key(tenant, stack, env))
            .await?
            .ok_or_else(|| PankaError::NotFound(format!("state for {tenant}/{stack}/{env}")))
    }

    /// Atomic put of the canonical document, then a second put of the
    /// timestamped snapshot (§4.6 "save"). Two saves landing in the same
    /// second may overwrite each other's snapshot; the canonical file
    /// stays authoritative either way.
    pub async fn save(
        &self,
        session: &Session,
        tenant: &str,
        stack: &str,
        env: &str,
        mut state: State,
    ) -> Result<()> {
        Self::check_isolation(session, tenant)?;
        state.record_deployment();
        self.put_json(&state_key(tenant, stack, env), &state).await?;

        let timestamp = now_iso_seconds();
        let key = history_key(tenant, stack, env, &timestamp);
        self.put_json(&key, &state).await?;

        info!(tenant, stack, env, %timestamp, "state saved");
        Ok(())
    }

    pub async fn history(
        &self,
        session: &Session,
        tenant: &str,
        stack: &str,
        env: &str,
        limit: usize,
    ) -> Result<Vec<Deployment>> {
        Self::check_isolation(session, tenant)?;
        let prefix = ObjectPath::from(history_prefix(tenant, stack, env));
        let mut entries = Vec::new();
        let mut stream = self.store.list(Some(&prefix));
        use futures::StreamExt;
        while let Some(meta) = stream.next().await {
            let meta = meta.map_err(|e| PankaError::BackendTransient(e.to_string()))?;
            entries.push(meta.location);
        }
        entries.sort_by(|a, b| b.as_ref().cmp(a.as_ref()));

        let mut deployments = Vec::with_capacity(limit.min(entries.len()));
        for path in entries.into_iter().take(limit) {
            let bytes = self
                .store
                .get(&path)
                .await
                .map_err(|e| PankaError::BackendTransient(e.to_string()))?
                .bytes()
                .await
                .map_err(|e| PankaError::BackendTransient(e.to_string()))?;
            let snapshot: State = serde_json::from_slice(&bytes)
                .map_err(|e| PankaError::SerializationError(e.to_string()))?;
            if let Some(last) = snapshot.deployment_history.last() {
                deployments.push(last.clone());
            }
        }
        Ok(deployments)
    }

    /// Copies the current canonical state into a fresh history snapshot
    /// without mutating it (§4.6 "backup").
    pub async fn backup(&self, session: &Session, tenant: &str, stack: &str, env: &str) -> Result<String> {
        Self::check_isolation(session, tenant)?;
        let state: State = self
            .get_json(&state_key(tenant, stack, env))
            .await?
            .ok_or_else(|| PankaError::NotFound(format!("state for {tenant}/{stack}/{env}")))?;
        let timestamp = now_iso_seconds();
        let key = history_key(tenant, stack, env, &timestamp);
        self.put_json(&key, &state).await?;
        info!(tenant, stack, env, %timestamp, "state backed up");
        Ok(timestamp)
    }

    /// Overwrites the canonical document with the snapshot at `timestamp`
    /// (§4.6 "restore"). The restore itself is also appended as a fresh
    /// history snapshot, so the prefix keeps a complete trail.
    pub async fn restore(
        &self,
        session: &Session,
        tenant: &str,
        stack: &str,
        env: &str,
        timestamp: &str,
    ) -> Result<()> {
        Self::check_isolation(session, tenant)?;
        let key = history_key(tenant, stack, env, timestamp);
        let snapshot: State = self
            .get_json(&key)
            .await?
            .ok_or_else(|| PankaError::NotFound(format!("history snapshot {timestamp:?}")))?;
        self.put_json(&state_key(tenant, stack, env), &snapshot).await?;
        warn!(tenant, stack, env, %timestamp, "state restored from snapshot");
        Ok(())
    }
}
