//! Route definitions for the audit trail and dashboards.

use axum::routing::get;
use axum::Router;

use crate::handlers::{audit, dashboard};
use crate::state::AppState;

/// Routes mounted at `/audit-logs`. Admin only.
pub fn audit_router() -> Router<AppState> {
    Router::new().route("/", get(audit::list_audit_logs))
}

/// Routes mounted at `/dashboard`.
///
/// ```text
/// GET /stats  -> stats (librarian)
/// GET /me     -> me
/// ```
pub fn dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard::stats))
        .route("/me", get(dashboard::me))
}
