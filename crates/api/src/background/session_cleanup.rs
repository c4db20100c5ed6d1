//! Periodic pruning of refresh-token sessions.
//!
//! Revoked sessions and sessions past `expires_at` can never be used again,
//! so they are deleted on a fixed interval.

use std::time::Duration;

use biblio_db::repositories::SessionRepo;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often stale sessions are pruned.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the session cleanup loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Session cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match SessionRepo::delete_stale(&pool, Utc::now()).await {
                    Ok(0) => tracing::debug!("Session cleanup: nothing to prune"),
                    Ok(deleted) => tracing::info!(deleted, "Session cleanup: pruned stale sessions"),
                    Err(e) => tracing::error!(error = %e, "Session cleanup: run failed"),
                }
            }
        }
    }
}
