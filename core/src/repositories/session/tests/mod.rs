//! Unit tests for the in-memory session repository

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::session::{RevocationReason, Session, SessionMetadata, SessionSelector};
use crate::repositories::session::{InMemorySessionRepository, SessionRepository, SessionRotation};

fn session(id: &str, user_id: Uuid, device: &str, expires_in: Duration) -> Session {
    Session::new(
        id,
        user_id,
        device,
        format!("{}-access", id),
        format!("{}-refresh", id),
        Utc::now() + expires_in,
        SessionMetadata::default(),
    )
}

fn rotation(new_id: &str) -> SessionRotation {
    SessionRotation {
        new_session_id: new_id.to_string(),
        new_access_hash: format!("{}-access", new_id),
        new_refresh_hash: format!("{}-refresh", new_id),
        new_expires_at: Utc::now() + Duration::days(30),
    }
}

#[tokio::test]
async fn test_create_and_find_by_hashes() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();

    let id = repo.create(session("s1", user_id, "d1", Duration::days(1))).await.unwrap();
    assert_eq!(id, "s1");

    let by_access = repo.find_by_user_and_access_hash(user_id, "s1-access").await.unwrap();
    assert_eq!(by_access.map(|s| s.session_id), Some("s1".to_string()));

    let by_refresh = repo.find_by_user_and_refresh_hash(user_id, "s1-refresh").await.unwrap();
    assert!(by_refresh.is_some());

    // Hash lookups are scoped to the owner
    let other = repo.find_by_user_and_access_hash(Uuid::new_v4(), "s1-access").await.unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn test_create_rejects_duplicates() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();

    repo.create(session("s1", user_id, "d1", Duration::days(1))).await.unwrap();
    assert!(repo.create(session("s1", user_id, "d2", Duration::days(1))).await.is_err());

    let mut clash = session("s2", user_id, "d2", Duration::days(1));
    clash.refresh_token_hash = "s1-refresh".to_string();
    assert!(repo.create(clash).await.is_err());
}

#[tokio::test]
async fn test_dead_sessions_are_invisible_to_lookups() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();

    repo.insert_raw(session("expired", user_id, "d1", Duration::seconds(-5))).await;
    let mut revoked = session("revoked", user_id, "d2", Duration::days(1));
    revoked.revoke(&RevocationReason::Logout, Utc::now());
    repo.insert_raw(revoked).await;

    assert!(repo.find_by_user_and_access_hash(user_id, "expired-access").await.unwrap().is_none());
    assert!(repo.find_by_user_and_refresh_hash(user_id, "revoked-refresh").await.unwrap().is_none());
    assert!(!repo.touch_activity("expired").await.unwrap());
    assert!(repo.list_active(user_id).await.unwrap().is_empty());

    // Rows still exist until reaped
    assert!(repo.find_by_id("expired").await.unwrap().is_some());
}

#[tokio::test]
async fn test_replace_is_conditional_on_current_refresh_hash() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();
    repo.create(session("s1", user_id, "d1", Duration::days(1))).await.unwrap();

    assert!(repo.replace("s1", "s1-refresh", rotation("s2")).await.unwrap());

    // Old identity is gone and the old hash can never match again
    assert!(repo.find_by_id("s1").await.unwrap().is_none());
    assert!(!repo.replace("s1", "s1-refresh", rotation("s3")).await.unwrap());
    assert!(repo.find_by_user_and_refresh_hash(user_id, "s1-refresh").await.unwrap().is_none());

    let current = repo.find_by_id("s2").await.unwrap().unwrap();
    assert_eq!(current.refresh_token_hash, "s2-refresh");
    assert_eq!(current.device_id, "d1");
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_replace_refuses_stale_hash() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();
    repo.create(session("s1", user_id, "d1", Duration::days(1))).await.unwrap();

    assert!(!repo.replace("s1", "not-the-current-hash", rotation("s2")).await.unwrap());
    assert!(repo.find_by_id("s1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_update_access_hash_keeps_identity() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();
    repo.create(session("s1", user_id, "d1", Duration::days(1))).await.unwrap();

    assert!(repo.update_access_hash("s1", "s1-refresh", "fresh-access").await.unwrap());

    let s = repo.find_by_id("s1").await.unwrap().unwrap();
    assert_eq!(s.access_token_hash, "fresh-access");
    assert_eq!(s.refresh_token_hash, "s1-refresh");
    assert!(!repo.update_access_hash("s1", "wrong", "x").await.unwrap());
}

#[tokio::test]
async fn test_revoke_counts_matches_and_is_idempotent() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();
    repo.create(session("s1", user_id, "d1", Duration::days(1))).await.unwrap();

    let selector = SessionSelector::SessionId("s1".to_string());
    assert_eq!(repo.revoke(&selector, &RevocationReason::Logout).await.unwrap(), 1);
    assert_eq!(repo.revoke(&selector, &RevocationReason::Security).await.unwrap(), 1);

    let s = repo.find_by_id("s1").await.unwrap().unwrap();
    assert!(s.is_revoked);
    assert_eq!(s.revoked_reason.as_deref(), Some("logout"));

    let missing = SessionSelector::SessionId("nope".to_string());
    assert_eq!(repo.revoke(&missing, &RevocationReason::Logout).await.unwrap(), 0);
}

#[tokio::test]
async fn test_revoke_by_device() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();
    repo.create(session("s1", user_id, "laptop", Duration::days(1))).await.unwrap();
    repo.create(session("s2", user_id, "phone", Duration::days(1))).await.unwrap();

    let selector = SessionSelector::TokenHashOrDevice("laptop".to_string());
    assert_eq!(repo.revoke(&selector, &RevocationReason::Logout).await.unwrap(), 1);
    assert_eq!(repo.count_active(user_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_revoke_all_for_user_spares_device() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();
    repo.create(session("s1", user_id, "d1", Duration::days(1))).await.unwrap();
    repo.create(session("s2", user_id, "d2", Duration::days(1))).await.unwrap();
    repo.create(session("s3", user_id, "d3", Duration::days(1))).await.unwrap();
    repo.create(session("s4", other_user, "d2", Duration::days(1))).await.unwrap();

    let count = repo
        .revoke_all_for_user(user_id, Some("d1"), &RevocationReason::LogoutOtherDevices)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let active = repo.list_active(user_id).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].device_id, "d1");
    assert_eq!(repo.count_active(other_user).await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_expired_ignores_revocation_state() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();
    repo.insert_raw(session("old", user_id, "d1", Duration::seconds(-10))).await;
    let mut old_revoked = session("old-revoked", user_id, "d2", Duration::seconds(-10));
    old_revoked.revoke(&RevocationReason::Logout, Utc::now());
    repo.insert_raw(old_revoked).await;
    let mut live_revoked = session("live-revoked", user_id, "d3", Duration::days(1));
    live_revoked.revoke(&RevocationReason::Logout, Utc::now());
    repo.insert_raw(live_revoked).await;

    let now = Utc::now();
    assert_eq!(repo.delete_expired(now).await.unwrap(), 2);
    assert_eq!(repo.delete_expired(now).await.unwrap(), 0);
    assert!(repo.find_by_id("live-revoked").await.unwrap().is_some());
}

#[tokio::test]
async fn test_list_active_orders_by_last_activity() {
    let repo = InMemorySessionRepository::new();
    let user_id = Uuid::new_v4();

    let mut older = session("older", user_id, "d1", Duration::days(1));
    older.last_activity = Utc::now() - Duration::hours(2);
    let mut newer = session("newer", user_id, "d2", Duration::days(1));
    newer.last_activity = Utc::now() - Duration::minutes(1);
    repo.insert_raw(older).await;
    repo.insert_raw(newer).await;

    let ids: Vec<String> = repo
        .list_active(user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.session_id)
        .collect();
    assert_eq!(ids, vec!["newer".to_string(), "older".to_string()]);

    assert!(repo.touch_activity("older").await.unwrap());
    let first = repo.list_active(user_id).await.unwrap().remove(0);
    assert_eq!(first.session_id, "older");
}
