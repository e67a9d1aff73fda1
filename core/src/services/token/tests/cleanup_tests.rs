//! Session reaper tests

use chrono::{Duration, Utc};
use std::sync::Arc;
use tg_shared::ReaperConfig;
use uuid::Uuid;

use crate::domain::entities::session::{ClientContext, Session, SessionMetadata};
use crate::repositories::{InMemorySessionRepository, SessionRepository};
use crate::services::token::SessionReaper;

use super::mocks::fixture;

fn expired(id: &str, revoked: bool) -> Session {
    let mut session = Session::new(
        id,
        Uuid::new_v4(),
        "device",
        format!("{}-a", id),
        format!("{}-r", id),
        Utc::now() - Duration::minutes(5),
        SessionMetadata::default(),
    );
    session.is_revoked = revoked;
    session
}

#[tokio::test]
async fn test_sweep_deletes_expired_regardless_of_revocation() {
    let f = fixture().await;
    let live = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &ClientContext::default())
        .await
        .unwrap();
    f.sessions.insert_raw(expired("old-1", false)).await;
    f.sessions.insert_raw(expired("old-2", true)).await;

    assert_eq!(f.service.sweep_expired_sessions().await.unwrap(), 2);
    assert_eq!(f.service.sweep_expired_sessions().await.unwrap(), 0);

    assert!(f.sessions.find_by_id(&live.session_id).await.unwrap().is_some());
    assert!(f.service.verify_access_token(&live.access_token).await.is_some());
}

#[tokio::test]
async fn test_revoked_but_unexpired_session_survives_sweep() {
    let f = fixture().await;
    let pair = f
        .service
        .issue_token_pair(f.user.id, &f.user.email, &f.user.role, &ClientContext::default())
        .await
        .unwrap();
    f.service.revoke_session(&pair.session_id, None).await.unwrap();

    assert_eq!(f.service.sweep_expired_sessions().await.unwrap(), 0);
    assert!(f.sessions.find_by_id(&pair.session_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_sweep_uses_supplied_clock() {
    let sessions = Arc::new(InMemorySessionRepository::new());
    sessions.insert_raw(expired("old", false)).await;
    let reaper = SessionReaper::new(sessions.clone(), ReaperConfig::default(), std::time::Duration::from_secs(1));

    assert_eq!(reaper.sweep(Utc::now() - Duration::hours(1)).await.unwrap(), 0);
    assert_eq!(reaper.sweep(Utc::now()).await.unwrap(), 1);
    assert!(sessions.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_run_until_sweeps_then_stops() {
    let sessions = Arc::new(InMemorySessionRepository::new());
    sessions.insert_raw(expired("old", false)).await;
    let config = ReaperConfig {
        interval_seconds: 60,
        enabled: true,
    };
    let reaper = SessionReaper::new(sessions.clone(), config, std::time::Duration::from_secs(1));

    // First tick fires immediately, the shutdown arrives before the second
    reaper
        .run_until(tokio::time::sleep(std::time::Duration::from_secs(30)))
        .await;
    assert!(sessions.is_empty().await);
}

#[tokio::test]
async fn test_disabled_reaper_does_not_start() {
    let sessions = Arc::new(InMemorySessionRepository::new());
    let config = ReaperConfig {
        interval_seconds: 60,
        enabled: false,
    };
    let reaper = Arc::new(SessionReaper::new(sessions.clone(), config, std::time::Duration::from_secs(1)));
    assert!(reaper.clone().start_background_task().is_none());

    // run_until returns at once when disabled
    reaper.run_until(std::future::pending()).await;
    assert_eq!(sessions.count_active(Uuid::new_v4()).await.unwrap(), 0);
}
