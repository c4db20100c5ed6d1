//! Handlers for the `/suspensions` resource. Librarians only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::error::CoreError;
use biblio_core::types::DbId;
use biblio_db::circulation;
use biblio_db::models::suspension::CreateSuspension;
use biblio_db::repositories::SuspensionRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::today;
use crate::middleware::rbac::RequireLibrarian;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /suspensions`.
#[derive(Debug, Deserialize)]
pub struct SuspensionListParams {
    pub user_id: Option<DbId>,
    /// Only suspensions covering today.
    #[serde(default)]
    pub active: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/suspensions
pub async fn list_suspensions(
    RequireLibrarian(_user): RequireLibrarian,
    State(state): State<AppState>,
    Query(params): Query<SuspensionListParams>,
) -> AppResult<impl IntoResponse> {
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let active_on = params.active.then(today);

    let suspensions = SuspensionRepo::list(
        &state.pool,
        params.user_id,
        active_on,
        page.limit(),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: suspensions }))
}

/// GET /api/v1/suspensions/{id}
pub async fn get_suspension(
    RequireLibrarian(_user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let suspension = SuspensionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Suspension",
            id,
        }))?;
    Ok(Json(DataResponse { data: suspension }))
}

/// POST /api/v1/suspensions
///
/// `start_date` defaults to today. The user is notified. Returns 201.
pub async fn create_suspension(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Json(input): Json<CreateSuspension>,
) -> AppResult<impl IntoResponse> {
    let suspension =
        circulation::create_suspension(&state.pool, &input, user.user_id, today()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: suspension })))
}

/// DELETE /api/v1/suspensions/{id}
///
/// Lifts the suspension immediately. Returns 204.
pub async fn delete_suspension(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    circulation::delete_suspension(&state.pool, id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
