// The consumed interface: a key-value store supporting conditional writes
// and TTL-based expiry (§4.7 "Backed by a key-value store..."). Concrete
// backends (DynamoDB, etcd, etc.) live outside this crate; this trait is
// the seam they plug into, mirroring `executor::ResourceExecutor` and
// `secrets::SecretsClient`.

use super::model::LockRecord;
use crate::error::PankaError;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[async_trait]
pub trait LockBackend: Send + Sync {
    /// Succeeds iff `record.lock_key` does not exist or the existing
    /// item's `expires_at < now`. Returns `LockHeld` on condition failure.
    async fn conditional_create(&self, record: &LockRecord, now: i64) -> Result<()>;

    /// Conditional update guarded by `lock_id` equality. Returns
    /// `LockLost` if the guard fails.
    async fn conditional_update(&self, record: &LockRecord) -> Result<()>;

    /// Conditional delete guarded by `lock_id` equality. A condition
    /// failure (already gone, or held by someone else) is treated as
    /// success — release is idempotent.
    async fn conditional_delete(&self, lock_key: &str, lock_id: &str) -> Result<()>;

    /// Unconditional delete, restricted to admin sessions by the caller.
    async fn force_delete(&self, lock_key: &str) -> Result<()>;

    async fn get(&self, lock_key: &str) -> Result<Option<LockRecord>>;

    async fn list(&self) -> Result<Vec<LockRecord>>;
}

/// In-process backend for tests — the distributed-system's worth of
/// semantics (CAS by existence/TTL, CAS by `lock_id`) collapsed onto a
/// `Mutex<HashMap>`.
#[derive(Default)]
pub struct InMemoryLockBackend {
    records: Mutex<HashMap<String, LockRecord>>,
}

impl InMemoryLockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockBackend for InMemoryLockBackend {
    async fn conditional_create(&self, record: &LockRecord, now: i64) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records.get(&record.lock_key) {
            if existing.expires_at >= now {
                return Err(PankaError::LockHeld(record.lock_key.clone()));
            }
        }
        records.insert(record.lock_key.clone(), record.clone());
        Ok(())
    }

    async fn conditional_update(&self, record: &LockRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        match records.get(&record.lock_key) {
            Some(existing) if existing.lock_id == record.lock_id => {
                records.insert(record.lock_key.clone(), record.clone());
                Ok(())
            }
            _ => Err(PankaError::LockLost(record.lock_key.clone())),
        }
    }

    async fn conditional_delete(&self, lock_key: &str, lock_id: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records.get(lock_key) {
            if existing.lock_id == lock_id {
                records.remove(lock_key);
            }
        }
        Ok(())
    }

    async fn force_delete(&self, lock_key: &str) -> Result<()> {
        self.records.lock().unwrap().remove(lock_key);
        Ok(())
    }

    async fn get(&self, lock_key: &str) -> Result<Option<LockRecord>> {
        Ok(self.records.lock().unwrap().get(lock_key).cloned())
    }

    async fn list(&self) -> Result<Vec<LockRecord>> {
        let mut records: Vec<LockRecord> = self.records.lock().unwrap().values().cloned().collect();
        records.sort_by(|a, b| a.lock_key.cmp(&b.lock_key));
        Ok(records)
    }
}
