//! Periodic due-date reminders.
//!
//! Every tick, each active loan due within `policy.due_reminder_days` gets
//! one `due_reminder` notification. Loans already reminded are skipped, so
//! a restart or a short interval does not spam the borrower.

use std::time::Duration;

use biblio_core::circulation::CirculationPolicy;
use biblio_db::circulation;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Run the reminder loop until `cancel` is triggered.
///
/// The first pass runs immediately at startup.
pub async fn run(
    pool: PgPool,
    policy: CirculationPolicy,
    period: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = period.as_secs(),
        reminder_days = policy.due_reminder_days,
        "Due reminder job started"
    );

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Due reminder job stopping");
                break;
            }
            _ = interval.tick() => {
                let today = Utc::now().date_naive();
                match circulation::send_due_reminders(&pool, &policy, today).await {
                    Ok(0) => tracing::debug!("Due reminders: nothing to send"),
                    Ok(sent) => tracing::info!(sent, %today, "Due reminders sent"),
                    Err(e) => tracing::error!(error = %e, "Due reminders: run failed"),
                }
            }
        }
    }
}
