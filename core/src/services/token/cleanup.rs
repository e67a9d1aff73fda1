//! Physical removal of expired sessions
//!
//! Revoked sessions are already invisible to every lookup; the reaper only
//! reclaims storage once `expires_at` has passed, revoked or not.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tg_shared::ReaperConfig;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::SessionRepository;

use super::store::bounded;

/// Periodic sweeper for expired session rows
pub struct SessionReaper<S: SessionRepository + 'static> {
    sessions: Arc<S>,
    config: ReaperConfig,
    store_timeout: Duration,
}

impl<S: SessionRepository> SessionReaper<S> {
    pub fn new(sessions: Arc<S>, config: ReaperConfig, store_timeout: Duration) -> Self {
        Self {
            sessions,
            config,
            store_timeout,
        }
    }

    pub fn config(&self) -> &ReaperConfig {
        &self.config
    }

    /// Delete every session with `expires_at < now`
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows deleted; 0 when run twice without time passing
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let deleted = bounded(
            "delete_expired",
            self.store_timeout,
            self.sessions.delete_expired(now),
        )
        .await?;
        if deleted > 0 {
            info!(deleted, "Swept expired sessions");
        }
        Ok(deleted)
    }

    /// Sweep on the configured interval until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if !self.config.enabled {
            warn!("Session reaper is disabled");
            return;
        }

        info!(
            interval_seconds = self.config.interval_seconds,
            "Session reaper started"
        );
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_seconds));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Session reaper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep(Utc::now()).await {
                        error!(error = %e, "Session sweep failed");
                    }
                }
            }
        }
    }

    /// Spawn the sweep loop on the current runtime
    pub fn start_background_task(self: Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Session reaper is disabled");
            return None;
        }
        Some(tokio::spawn(async move {
            self.run_until(std::future::pending()).await;
        }))
    }
}
