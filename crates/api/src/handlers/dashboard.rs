//! Dashboard aggregates.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use biblio_db::repositories::DashboardRepo;

use crate::error::AppResult;
use crate::handlers::today;
use crate::middleware::rbac::{RequireAuth, RequireLibrarian};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/dashboard/stats
///
/// Library-wide counts for the librarian home screen.
pub async fn stats(
    RequireLibrarian(_user): RequireLibrarian,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = DashboardRepo::library_stats(&state.pool, today()).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/v1/dashboard/me
pub async fn me(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let summary = DashboardRepo::reader_summary(&state.pool, user.user_id, today()).await?;
    Ok(Json(DataResponse { data: summary }))
}
