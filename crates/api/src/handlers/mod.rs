pub mod audit;
pub mod auth;
pub mod authors;
pub mod books;
pub mod categories;
pub mod dashboard;
pub mod loan_requests;
pub mod loans;
pub mod notifications;
pub mod penalties;
pub mod stocks;
pub mod suspensions;
pub mod users;

use biblio_core::types::Date;
use biblio_db::models::audit::CreateAuditLog;
use biblio_db::repositories::AuditLogRepo;
use chrono::Utc;

use crate::state::AppState;

/// Calendar date used for due dates, lateness and suspensions.
pub(crate) fn today() -> Date {
    Utc::now().date_naive()
}

/// Append an audit entry for a change that has already been committed.
///
/// Catalog and account edits are single statements outside a transaction, so
/// a failed audit insert is logged rather than reported as a failed request.
/// Workflow steps in `biblio_db::circulation` audit inside their transaction
/// instead.
pub(crate) async fn record_audit(state: &AppState, entry: CreateAuditLog) {
    if let Err(e) = AuditLogRepo::create(&state.pool, &entry).await {
        tracing::warn!(
            error = %e,
            action = entry.action,
            entity_type = entry.entity_type,
            entity_id = entry.entity_id,
            "Failed to write audit log entry"
        );
    }
}
