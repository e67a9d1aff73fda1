//! Periodically deletes expired sessions until interrupted.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use tg_core::services::SessionReaper;
use tg_infra::database::{DatabasePool, MySqlSessionRepository};
use tg_infra::telemetry::init_tracing;
use tg_shared::{AppConfig, DatabaseConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.logging).context("failed to initialise tracing")?;

    let database = DatabaseConfig::from_lookup(|key| std::env::var(key).ok())
        .context("failed to load database configuration")?;
    let pool = DatabasePool::new(&database)
        .await
        .context("failed to connect to database")?;
    pool.run_migrations().await.context("failed to run migrations")?;

    let sessions = Arc::new(MySqlSessionRepository::new(pool.pool().clone()));
    let reaper = SessionReaper::new(
        sessions,
        config.reaper.clone(),
        Duration::from_millis(config.session.store_timeout_ms),
    );

    info!(environment = %config.environment, stats = %pool.statistics(), "Starting session reaper");
    reaper
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    pool.close().await;
    info!("Session reaper stopped");
    Ok(())
}
