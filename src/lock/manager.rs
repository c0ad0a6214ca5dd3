// Lock Manager (C7, §4.7).

use super::backend::LockBackend;
use super::model::{LockInfo, LockRecord};
use crate::error::PankaError;
use crate::session::{Session, SessionMode};
use crate::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

const DEFAULT_TTL_SECS: i64 = 3600;

/// A successful `acquire`. Dropping it aborts the background heartbeat
/// task — cancellation of the parent operation must close/signal the
/// heartbeat task (§5 "Cancellation and timeouts").
pub struct LockHandle {
    pub lock_key: String,
    pub lock_id: String,
    pub(crate) heartbeat_task: Option<JoinHandle<()>>,
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Some(task) = self.heartbeat_task.take() {
            task.abort();
        }
    }
}

pub struct LockManager {
    backend: Arc<dyn LockBackend>,
    ttl_secs: i64,
}

impl LockManager {
    pub fn new(backend: Arc<dyn LockBackend>) -> Self {
        Self {
            backend,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    pub fn with_ttl(backend: Arc<dyn LockBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl_secs: ttl.as_secs() as i64,
        }
    }

    fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs((self.ttl_secs / 120).max(1) as u64)
    }

    /// Conditional put guarded by existence/expiry, then spawns a
    /// background heartbeat task renewing the lease at `TTL/120`
    /// (§4.7 "acquire").
    pub async fn acquire(
        &self,
        lock_key: &str,
        locked_by: &str,
        metadata: HashMap<String, String>,
    ) -> Result<LockHandle> {
        let now = Utc::now().timestamp();
        let lock_id = Uuid::new_v4().to_string();
        let record = LockRecord {
            lock_key: lock_key.to_string(),
            lock_id: lock_id.clone(),
            locked_by: locked_by.to_string(),
            locked_at: now,
            expires_at: now + self.ttl_secs,
            last_heartbeat: now,
            metadata,
        };

        self.backend.conditional_create(&record, now).await?;

        let heartbeat_task = self.spawn_heartbeat(record);

        Ok(LockHandle {
            lock_key: lock_key.to_string(),
            lock_id,
            heartbeat_task: Some(heartbeat_task),
        })
    }

    fn spawn_heartbeat(&self, mut record: LockRecord) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let ttl_secs = self.ttl_secs;
        let interval = self.heartbeat_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let now = Utc::now().timestamp();
                record.last_heartbeat = now;
                record.expires_at = now + ttl_secs;
                // A failed heartbeat logs but does not tear down the lock by
                // itself (§4.7): the next tick may succeed. If the guard
                // fails because someone else now owns the key, every
                // subsequent tick will fail too and this task just keeps
                // logging until the holder observes it via `get_lock` or
                // drops the handle.
                if let Err(e) = backend.conditional_update(&record).await {
                    match e {
                        PankaError::LockLost(_) => {
                            error!(lock_key = %record.lock_key, "heartbeat lost lock ownership");
                        }
                        other => {
                            warn!(lock_key = %record.lock_key, error = %other, "heartbeat failed, will retry");
                        }
                    }
                }
            }
        })
    }

    /// Manual heartbeat, for callers that want to extend the lease outside
    /// the automatic background cadence (e.g. tests).
    pub async fn heartbeat(&self, handle: &LockHandle) -> Result<()> {
        let now = Utc::now().timestamp();
        let record = LockRecord {
            lock_key: handle.lock_key.clone(),
            lock_id: handle.lock_id.clone(),
            locked_by: String::new(),
            locked_at: now,
            expires_at: now + self.ttl_secs,
            last_heartbeat: now,
            metadata: HashMap::new(),
        };
        // Preserve `locked_by`/`metadata` from the existing record; only
        // `lock_id` needs to match for the conditional guard to pass.
        let mut record = record;
        if let Some(existing) = self.backend.get(&handle.lock_key).await? {
            record.locked_by = existing.locked_by;
            record.metadata = existing.metadata;
        }
        self.backend.conditional_update(&record).await
    }

    /// Conditional delete guarded by `lock_id`; a condition failure is
    /// treated as success (§4.7 "release").
    pub async fn release(&self, handle: LockHandle) -> Result<()> {
        self.backend
            .conditional_delete(&handle.lock_key, &handle.lock_id)
            .await
        // `handle` drops here, aborting the heartbeat task.
    }

    pub async fn get_lock(&self, lock_key: &str) -> Result<LockInfo> {
        let record = self
            .backend
            .get(lock_key)
            .await?
            .ok_or_else(|| PankaError::LockNotFound(lock_key.to_string()))?;
        let now = Utc::now().timestamp();
        Ok(LockInfo::from_record(
            &record,
            now,
            self.heartbeat_interval().as_secs() as i64,
        ))
    }

    pub async fn list_locks(&self) -> Result<Vec<LockInfo>> {
        let now = Utc::now().timestamp();
        let interval = self.heartbeat_interval().as_secs() as i64;
        let records = self.backend.list().await?;
        Ok(records
            .iter()
            .map(|r| LockInfo::from_record(r, now, interval))
            .collect())
    }

    /// Unconditional delete, restricted to admin sessions (§4.7
    /// "force-unlock").
    pub async fn force_unlock(&self, session: &Session, lock_key: &str) -> Result<()> {
        if session.mode != SessionMode::Admin {
            return Err(PankaError::Forbidden(
                "force-unlock requires an admin session".to_string(),
            ));
        }
        self.backend.force_delete(lock_key).await
    }
}
