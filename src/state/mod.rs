// State Store (C6, §4.6).

pub mod model;
pub mod store;

pub use model::{Deployment, ResourceHealth, ResourceState, State, StateMetadata, StateNetworking};
pub use store::StateStore;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PankaError;
    use crate::session::{Session, SessionMode};
    use chrono::{Duration as ChronoDuration, Utc};
    use object_store::memory::InMemory;
    use std::sync::Arc;

    fn store() -> StateStore {
        StateStore::new(Arc::new(InMemory::new()))
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

    #[tokio::test]
    async fn load_before_any_save_is_not_found() {
        let s = store();
        let session = tenant_session("acme");
        let result = s.load(&session, "acme", "web", "prod").await;
        assert!(matches!(result, Err(PankaError::NotFound(_))));
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let s = store();
        let session = tenant_session("acme");
        let state = State::new(
            "web".to_string(),
            "prod".to_string(),
            "alice".to_string(),
            "dep-1".to_string(),
        );
        s.save(&session, "acme", "web", "prod", state).await.unwrap();

        let loaded = s.load(&session, "acme", "web", "prod").await.unwrap();
        assert_eq!(loaded.metadata.deployment_id, "dep-1");
        assert_eq!(loaded.deployment_history.len(), 1);
    }

    #[tokio::test]
    async fn tenant_session_cannot_access_another_tenants_state() {
        let s = store();
        let owner = tenant_session("acme");
        let state = State::new(
            "web".to_string(),
            "prod".to_string(),
            "alice".to_string(),
            "dep-1".to_string(),
        );
        s.save(&owner, "acme", "web", "prod", state).await.unwrap();

        let intruder = tenant_session("globex");
        let result = s.load(&intruder, "acme", "web", "prod").await;
        assert!(matches!(result, Err(PankaError::Forbidden(_))));
    }

    #[tokio::test]
    async fn admin_session_can_access_any_tenant() {
        let s = store();
        let owner = tenant_session("acme");
        let state = State::new(
            "web".to_string(),
            "prod".to_string(),
            "alice".to_string(),
            "dep-1".to_string(),
        );
        s.save(&owner, "acme", "web", "prod", state).await.unwrap();

        let admin = admin_session();
        assert!(s.load(&admin, "acme", "web", "prod").await.is_ok());
    }

    #[tokio::test]
    async fn history_returns_most_recent_deployments_first() {
        let s = store();
        let session = tenant_session("acme");
        for i in 1..=3 {
            let state = State::new(
                "web".to_string(),
                "prod".to_string(),
                "alice".to_string(),
                format!("dep-{i}"),
            );
            s.save(&session, "acme", "web", "prod", state).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        }

        let history = s.history(&session, "acme", "web", "prod", 10).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].deployment_id, "dep-3");
    }

    #[tokio::test]
    async fn backup_then_restore_recovers_prior_snapshot() {
        let s = store();
        let session = tenant_session("acme");
        let first = State::new(
            "web".to_string(),
            "prod".to_string(),
            "alice".to_string(),
            "dep-1".to_string(),
        );
        s.save(&session, "acme", "web", "prod", first).await.unwrap();
        let snapshot_ts = s.backup(&session, "acme", "web", "prod").await.unwrap();

        let second = State::new(
            "web".to_string(),
            "prod".to_string(),
            "bob".to_string(),
            "dep-2".to_string(),
        );
        s.save(&session, "acme", "web", "prod", second).await.unwrap();
        assert_eq!(
            s.load(&session, "acme", "web", "prod").await.unwrap().metadata.deployed_by,
            "bob"
        );

        s.restore(&session, "acme", "web", "prod", &snapshot_ts)
            .await
            .unwrap();
        assert_eq!(
            s.load(&session, "acme", "web", "prod").await.unwrap().metadata.deployed_by,
            "alice"
        );
    }

    #[test]
    fn inline_history_is_bounded() {
        let mut state = State::new(
            "web".to_string(),
            "prod".to_string(),
            "alice".to_string(),
            "dep-0".to_string(),
        );
        for i in 0..(model::MAX_INLINE_HISTORY + 10) {
            state.metadata.deployment_id = format!("dep-{i}");
            state.record_deployment();
        }
        assert_eq!(state.deployment_history.len(), model::MAX_INLINE_HISTORY);
        assert_eq!(
            state.deployment_history.last().unwrap().deployment_id,
            format!("dep-{}", model::MAX_INLINE_HISTORY + 9)
        );
    }
}
