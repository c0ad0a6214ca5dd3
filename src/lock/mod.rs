// Lock Manager (C7, §4.7).

pub mod backend;
pub mod manager;
pub mod model;

pub use backend::{InMemoryLockBackend, LockBackend};
pub use manager::{LockHandle, LockManager};
pub use model::{component_lock_key, service_lock_key, stack_lock_key, LockInfo, LockRecord};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PankaError;
    use crate::session::{Session, SessionMode};
    use chrono::{Duration as ChronoDuration, Utc};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn manager() -> LockManager {
        LockManager::with_ttl(
            Arc::new(InMemoryLockBackend::new()),
            Duration::from_secs(120),
        )
    }

    fn admin_session() -> Session {
        Session {
            mode: SessionMode::Admin,
            bucket: "panka-state".to_string(),
            region: "us-east-1".to_string(),
            tenant: None,
            authenticated: Utc::now(),
            expires: Utc::now() + ChronoDuration::hours(1),
        }
    }

    fn tenant_session(tenant: &str) -> Session {
        Session {
            mode: SessionMode::Tenant,
            bucket: "panka-state".to_string(),
            region: "us-east-1".to_string(),
            tenant: Some(tenant.to_string()),
            authenticated: Utc::now(),
            expires: Utc::now() + ChronoDuration::hours(1),
        }
    }

    #[tokio::test]
    async fn acquire_then_release_round_trips() {
        let mgr = manager();
        let key = stack_lock_key("acme", "web", "prod");
        let handle = mgr.acquire(&key, "alice", HashMap::new()).await.unwrap();
        assert_eq!(handle.lock_key, key);

        let info = mgr.get_lock(&key).await.unwrap();
        assert_eq!(info.locked_by, "alice");
        assert!(!info.is_stale);

        mgr.release(handle).await.unwrap();
        assert!(mgr.get_lock(&key).await.is_err());
    }

    #[tokio::test]
    async fn second_acquire_on_held_lock_fails() {
        let mgr = manager();
        let key = stack_lock_key("acme", "web", "prod");
        let _handle = mgr.acquire(&key, "alice", HashMap::new()).await.unwrap();

        let second = mgr.acquire(&key, "bob", HashMap::new()).await;
        assert!(matches!(second, Err(PankaError::LockHeld(_))));
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let mgr = manager();
        let key = stack_lock_key("acme", "web", "prod");
        let handle = mgr.acquire(&key, "alice", HashMap::new()).await.unwrap();
        let stray = LockHandle {
            lock_key: handle.lock_key.clone(),
            lock_id: handle.lock_id.clone(),
            heartbeat_task: None,
        };
        mgr.release(handle).await.unwrap();
        // Releasing again with the same (now stale) id must not error.
        mgr.release(stray).await.unwrap();
    }

    #[tokio::test]
    async fn manual_heartbeat_extends_expiry() {
        let mgr = manager();
        let key = stack_lock_key("acme", "web", "prod");
        let handle = mgr.acquire(&key, "alice", HashMap::new()).await.unwrap();
        let before = mgr.get_lock(&key).await.unwrap().expires_at;
        std::thread::sleep(Duration::from_millis(1100));
        mgr.heartbeat(&handle).await.unwrap();
        let after = mgr.get_lock(&key).await.unwrap().expires_at;
        assert!(after >= before);
    }

    #[tokio::test]
    async fn force_unlock_requires_admin_session() {
        let mgr = manager();
        let key = stack_lock_key("acme", "web", "prod");
        let _handle = mgr.acquire(&key, "alice", HashMap::new()).await.unwrap();

        let denied = mgr.force_unlock(&tenant_session("acme"), &key).await;
        assert!(matches!(denied, Err(PankaError::Forbidden(_))));
        assert!(mgr.get_lock(&key).await.is_ok());

        mgr.force_unlock(&admin_session(), &key).await.unwrap();
        assert!(mgr.get_lock(&key).await.is_err());
    }

    #[tokio::test]
    async fn list_locks_reports_every_held_key() {
        let mgr = manager();
        let _a = mgr
            .acquire(
                &stack_lock_key("acme", "web", "prod"),
                "alice",
                HashMap::new(),
            )
            .await
            .unwrap();
        let _b = mgr
            .acquire(
                &service_lock_key("acme", "web", "prod", "api"),
                "bob",
                HashMap::new(),
            )
            .await
            .unwrap();

        let locks = mgr.list_locks().await.unwrap();
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn key_builders_nest_stack_service_component() {
        let stack = stack_lock_key("acme", "web", "prod");
        let service = service_lock_key("acme", "web", "prod", "api");
        let component = component_lock_key("acme", "web", "prod", "api", "db");
        assert!(service.starts_with(&stack));
        assert!(component.starts_with(&service));
    }
}
