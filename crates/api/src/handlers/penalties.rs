//! Handlers for the `/penalties` resource.
//!
//! Late-return and lost-item penalties are raised by the loan workflow;
//! librarians can also enter one by hand and settle any unpaid penalty.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::error::CoreError;
use biblio_core::status::PaymentStatus;
use biblio_core::types::DbId;
use biblio_db::circulation;
use biblio_db::models::penalty::{CreatePenalty, PenaltyFilter};
use biblio_db::repositories::PenaltyRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireLibrarian;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /penalties`.
#[derive(Debug, Deserialize)]
pub struct PenaltyListParams {
    /// Librarians only; readers always see their own penalties.
    pub user_id: Option<DbId>,
    /// `unpaid`, `paid` or `waived`.
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/penalties
pub async fn list_penalties(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PenaltyListParams>,
) -> AppResult<impl IntoResponse> {
    let payment_status_id = params
        .status
        .as_deref()
        .map(|name| {
            PaymentStatus::from_name(name)
                .map(PaymentStatus::id)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown payment status '{name}'")))
        })
        .transpose()?;

    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let filter = PenaltyFilter {
        user_id: if auth.is_librarian() {
            params.user_id
        } else {
            Some(auth.user_id)
        },
        payment_status_id,
        limit: page.limit(),
        offset: page.offset(),
    };

    let penalties = PenaltyRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: penalties }))
}

/// GET /api/v1/penalties/{id}
pub async fn get_penalty(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let penalty = PenaltyRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Penalty",
            id,
        }))?;
    auth.ensure_access(penalty.user_id, "penalty")?;

    Ok(Json(DataResponse { data: penalty }))
}

/// POST /api/v1/penalties
///
/// Manual penalty, e.g. for a damaged copy. Returns 201.
pub async fn create_penalty(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Json(input): Json<CreatePenalty>,
) -> AppResult<impl IntoResponse> {
    let penalty = circulation::create_penalty(&state.pool, &input, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: penalty })))
}

/// POST /api/v1/penalties/{id}/pay
pub async fn pay_penalty(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let penalty =
        circulation::settle_penalty(&state.pool, id, user.user_id, PaymentStatus::Paid).await?;
    Ok(Json(DataResponse { data: penalty }))
}

/// POST /api/v1/penalties/{id}/waive
pub async fn waive_penalty(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let penalty =
        circulation::settle_penalty(&state.pool, id, user.user_id, PaymentStatus::Waived).await?;
    Ok(Json(DataResponse { data: penalty }))
}
