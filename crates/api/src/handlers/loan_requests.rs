//! Handlers for the `/loan-requests` resource.
//!
//! Readers submit and cancel their own requests; librarians see every
//! request and approve or reject pending ones. State changes go through
//! `biblio_db::circulation`, which runs each step in one transaction.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::error::CoreError;
use biblio_core::status::LoanRequestStatus;
use biblio_core::types::DbId;
use biblio_db::circulation;
use biblio_db::models::loan::LoanSummary;
use biblio_db::models::loan_request::{
    CreateLoanRequest, LoanRequestFilter, LoanRequestItem, LoanRequestWithItems,
};
use biblio_db::repositories::LoanRequestRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::today;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireLibrarian;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /loan-requests`.
#[derive(Debug, Deserialize)]
pub struct LoanRequestListParams {
    /// `pending`, `approved`, `rejected` or `canceled`.
    pub status: Option<String>,
    /// Librarians only; readers always see their own requests.
    pub requester_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `POST /loan-requests/{id}/reject`.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// Result of an approval: the decided request and the loan it issued.
#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub request: LoanRequestWithItems,
    pub loan: LoanSummary,
}

/// GET /api/v1/loan-requests
pub async fn list_requests(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<LoanRequestListParams>,
) -> AppResult<impl IntoResponse> {
    let status_id = params
        .status
        .as_deref()
        .map(|name| {
            LoanRequestStatus::from_name(name).map(LoanRequestStatus::id).ok_or_else(|| {
                AppError::BadRequest(format!("Unknown loan request status '{name}'"))
            })
        })
        .transpose()?;

    let requester_id = if auth.is_librarian() {
        params.requester_id
    } else {
        Some(auth.user_id)
    };

    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let filter = LoanRequestFilter {
        requester_id,
        status_id,
        limit: page.limit(),
        offset: page.offset(),
    };

    let requests = LoanRequestRepo::list(&state.pool, &filter).await?;
    let ids: Vec<DbId> = requests.iter().map(|r| r.id).collect();
    let mut items_by_request: HashMap<DbId, Vec<LoanRequestItem>> = HashMap::new();
    for item in LoanRequestRepo::list_items_for_requests(&state.pool, &ids).await? {
        items_by_request
            .entry(item.loan_request_id)
            .or_default()
            .push(item);
    }

    let data: Vec<LoanRequestWithItems> = requests
        .into_iter()
        .map(|r| {
            let items = items_by_request.remove(&r.id).unwrap_or_default();
            LoanRequestWithItems::new(r, items)
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/loan-requests/{id}
///
/// Visible to the requester and to librarians.
pub async fn get_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = LoanRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Loan request",
            id,
        }))?;
    auth.ensure_access(request.requester_id, "loan request")?;

    let items = LoanRequestRepo::list_items(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: LoanRequestWithItems::new(request, items),
    }))
}

/// POST /api/v1/loan-requests
///
/// Submit a request for the caller. Each line names a book, an optional
/// language and a quantity (default 1).
pub async fn create_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateLoanRequest>,
) -> AppResult<impl IntoResponse> {
    let request = circulation::submit_request(
        &state.pool,
        auth.user_id,
        &input.items,
        &state.config.policy,
        today(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// POST /api/v1/loan-requests/{id}/approve
///
/// Reserve stock for every line and issue the loan, or fail without
/// touching any stock row.
pub async fn approve_request(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let today = today();
    let approval =
        circulation::approve_request(&state.pool, id, user.user_id, &state.config.policy, today)
            .await?;

    Ok(Json(DataResponse {
        data: ApprovalResponse {
            request: approval.request,
            loan: LoanSummary::new(approval.loan, today),
        },
    }))
}

/// POST /api/v1/loan-requests/{id}/reject
pub async fn reject_request(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectRequest>,
) -> AppResult<impl IntoResponse> {
    let request = circulation::reject_request(&state.pool, id, user.user_id, &input.reason).await?;
    Ok(Json(DataResponse { data: request }))
}

/// POST /api/v1/loan-requests/{id}/cancel
///
/// Only the requester may cancel, and only while the request is pending.
pub async fn cancel_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = circulation::cancel_request(&state.pool, id, auth.user_id).await?;
    Ok(Json(DataResponse { data: request }))
}
