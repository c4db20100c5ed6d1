//! Read access to the audit trail. Admin only.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use biblio_db::models::audit::AuditQuery;
use biblio_db::repositories::AuditLogRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/audit-logs
///
/// Newest first, filtered by `action`, `entity_type` and `actor_id`.
pub async fn list_audit_logs(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let logs = AuditLogRepo::query(&state.pool, &params, limit, offset).await?;
    Ok(Json(DataResponse { data: logs }))
}
