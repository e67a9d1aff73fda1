//! Issue and verify paths of the session service

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::session::{ClientContext, DeviceInfo, LoginMethod};
use crate::errors::DomainError;
use crate::repositories::{InMemoryUserRepository, SessionRepository};
use crate::services::token::{SessionService, TokenHasher, Sha256TokenHasher};

use super::mocks::{fixture, fixture_with, test_config, Fault, FaultySessionRepository};

fn web_context() -> ClientContext {
    ClientContext {
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
        device: DeviceInfo {
            device_id: Some("laptop".to_string()),
            device_name: Some("Work laptop".to_string()),
            browser: Some("Firefox".to_string()),
            os: Some("Linux".to_string()),
        },
        login_method: LoginMethod::Otp,
    }
}

#[tokio::test]
async fn test_issue_then_verify() {
    let f = fixture().await;
    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context())
        .await
        .unwrap();

    let principal = f.service.verify_access_token(&pair.access_token).await.unwrap();
    assert_eq!(principal.user_id, f.user.id);
    assert_eq!(principal.email, "alice@example.com");
    assert_eq!(principal.role, "member");
    assert_eq!(principal.session_id, pair.session_id);
}

#[tokio::test]
async fn test_issue_persists_hashes_and_metadata() {
    let f = fixture().await;
    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context())
        .await
        .unwrap();

    let session = f.sessions.find_by_id(&pair.session_id).await.unwrap().unwrap();
    assert_eq!(session.user_id, f.user.id);
    assert_eq!(session.device_id, "laptop");
    assert_eq!(session.access_token_hash, Sha256TokenHasher.hash(&pair.access_token));
    assert_eq!(session.refresh_token_hash, Sha256TokenHasher.hash(&pair.refresh_token));
    assert_ne!(session.access_token_hash, pair.access_token);
    assert_eq!(session.expires_at, pair.refresh_expires_at);
    assert!(!session.is_revoked);
    assert_eq!(session.metadata.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(session.metadata.browser.as_deref(), Some("Firefox"));
    assert_eq!(session.metadata.login_method, LoginMethod::Otp);
}

#[tokio::test]
async fn test_issue_generates_device_id_when_absent() {
    let f = fixture().await;
    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &ClientContext::default())
        .await
        .unwrap();

    let session = f.sessions.find_by_id(&pair.session_id).await.unwrap().unwrap();
    assert!(!session.device_id.is_empty());
}

#[tokio::test]
async fn test_verify_rejects_refresh_token_and_garbage() {
    let f = fixture().await;
    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context())
        .await
        .unwrap();

    assert!(f.service.verify_access_token(&pair.refresh_token).await.is_none());
    assert!(f.service.verify_access_token("garbage").await.is_none());
}

#[tokio::test]
async fn test_verify_rejects_unknown_and_inactive_users() {
    let f = fixture().await;

    // Token for a user the directory does not know
    let stranger = f
        .service
        .issue_token_pair(Uuid::new_v4(), "eve@example.com", "member", &web_context())
        .await
        .unwrap();
    assert!(f.service.verify_access_token(&stranger.access_token).await.is_none());

    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context())
        .await
        .unwrap();
    assert!(f.users.deactivate(f.user.id).await);
    assert!(f.service.verify_access_token(&pair.access_token).await.is_none());
}

#[tokio::test]
async fn test_expired_session_is_absent() {
    let f = fixture().await;
    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context())
        .await
        .unwrap();

    let mut session = f.sessions.find_by_id(&pair.session_id).await.unwrap().unwrap();
    session.expires_at = Utc::now() - Duration::seconds(1);
    f.sessions.insert_raw(session).await;

    assert!(f.service.verify_access_token(&pair.access_token).await.is_none());
    assert_eq!(f.service.refresh_access_token(&pair.refresh_token).await.unwrap(), None);
    assert!(f.service.list_active_sessions(f.user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_verify_touches_activity() {
    let f = fixture().await;
    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context())
        .await
        .unwrap();

    let stale = Utc::now() - Duration::hours(2);
    let mut session = f.sessions.find_by_id(&pair.session_id).await.unwrap().unwrap();
    session.last_activity = stale;
    f.sessions.insert_raw(session).await;

    assert!(f.service.verify_access_token(&pair.access_token).await.is_some());
    let session = f.sessions.find_by_id(&pair.session_id).await.unwrap().unwrap();
    assert!(session.last_activity > stale);
}

#[tokio::test]
async fn test_activity_touch_is_throttled() {
    let f = fixture_with(test_config().with_activity_touch_interval(Duration::hours(1))).await;
    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context())
        .await
        .unwrap();
    let before = f.sessions.find_by_id(&pair.session_id).await.unwrap().unwrap().last_activity;

    assert!(f.service.verify_access_token(&pair.access_token).await.is_some());
    let after = f.sessions.find_by_id(&pair.session_id).await.unwrap().unwrap().last_activity;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_verify_fails_closed_on_store_error() {
    let sessions = Arc::new(FaultySessionRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let user = crate::domain::entities::user::User::new(Uuid::new_v4(), "carol@example.com", "member");
    users.insert(user.clone()).await;
    let service = SessionService::new(sessions.clone(), users, test_config());

    let pair = service
        .issue_token_pair(user.id, &user.email, &user.role, &web_context())
        .await
        .unwrap();

    sessions.set_fault(Fault::Fail);
    assert!(service.verify_access_token(&pair.access_token).await.is_none());

    sessions.set_fault(Fault::None);
    assert!(service.verify_access_token(&pair.access_token).await.is_some());
}

#[tokio::test]
async fn test_issue_fails_on_store_error() {
    let sessions = Arc::new(FaultySessionRepository::new());
    let service = SessionService::new(sessions.clone(), Arc::new(InMemoryUserRepository::new()), test_config());
    sessions.set_fault(Fault::Fail);

    let err = service
        .issue_token_pair(Uuid::new_v4(), "dave@example.com", "member", &web_context())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Persistence { .. }));
    assert!(err.is_retryable());
    assert!(sessions.inner.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_issue_times_out_on_stalled_store() {
    let sessions = Arc::new(FaultySessionRepository::new());
    let service = SessionService::new(sessions.clone(), Arc::new(InMemoryUserRepository::new()), test_config());
    sessions.set_fault(Fault::Stall(std::time::Duration::from_secs(60)));

    let err = service
        .issue_token_pair(Uuid::new_v4(), "dave@example.com", "member", &web_context())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::StoreTimeout {
            operation: "create".to_string(),
            timeout_ms: 200,
        }
    );
    assert!(err.is_retryable());
    assert!(!err.is_authentication_failure());
    assert!(sessions.inner.is_empty().await);
}

#[tokio::test]
async fn test_list_active_sessions_most_recent_first() {
    let f = fixture().await;
    let first = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context().with_device_id("phone"))
        .await
        .unwrap();
    let second = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context().with_device_id("tablet"))
        .await
        .unwrap();

    let mut older = f.sessions.find_by_id(&first.session_id).await.unwrap().unwrap();
    older.last_activity = Utc::now() - Duration::minutes(10);
    f.sessions.insert_raw(older).await;

    let listed = f.service.list_active_sessions(f.user.id).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec![second.session_id.as_str(), first.session_id.as_str()]);
    assert_eq!(listed[0].device_id, "tablet");
}

#[tokio::test]
async fn test_decode_unsafe_via_service() {
    let f = fixture().await;
    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &web_context())
        .await
        .unwrap();

    let claims = f.service.decode_unsafe(&pair.access_token).unwrap();
    assert_eq!(claims.user_id, f.user.id);
    assert_eq!(claims.session_id, pair.session_id);
    assert!(f.service.decode_unsafe("nope").is_none());
}
