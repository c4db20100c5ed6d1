//! Handlers for the `/loans` resource.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::error::CoreError;
use biblio_core::status::LoanStatus;
use biblio_core::types::{Date, DbId};
use biblio_db::circulation::{self, Actor, Settlement};
use biblio_db::models::loan::{Loan, LoanDetail, LoanFilter, LoanSummary, ReturnLoan};
use biblio_db::models::penalty::Penalty;
use biblio_db::repositories::{LoanRepo, PenaltyRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::books::validate_condition_note;
use crate::handlers::today;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireLibrarian;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /loans`.
#[derive(Debug, Deserialize)]
pub struct LoanListParams {
    /// `active`, `returned`, `late_returned` or `lost`.
    pub status: Option<String>,
    /// Only active loans past their due date.
    #[serde(default)]
    pub overdue: bool,
    /// Librarians only; readers always see their own loans.
    pub borrower_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A closed loan and the penalty the closure raised, if any.
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub loan: LoanSummary,
    pub penalty: Option<Penalty>,
}

impl SettlementResponse {
    fn new(settlement: Settlement, today: Date) -> Self {
        Self {
            loan: LoanSummary::new(settlement.loan, today),
            penalty: settlement.penalty,
        }
    }
}

async fn find_loan(state: &AppState, id: DbId) -> AppResult<Loan> {
    LoanRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Loan", id }))
}

/// GET /api/v1/loans
pub async fn list_loans(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<LoanListParams>,
) -> AppResult<impl IntoResponse> {
    let status_id = params
        .status
        .as_deref()
        .map(|name| {
            LoanStatus::from_name(name)
                .map(LoanStatus::id)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown loan status '{name}'")))
        })
        .transpose()?;

    let borrower_id = if auth.is_librarian() {
        params.borrower_id
    } else {
        Some(auth.user_id)
    };

    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let today = today();
    let filter = LoanFilter {
        borrower_id,
        status_id,
        overdue_only: params.overdue,
        today,
        limit: page.limit(),
        offset: page.offset(),
    };

    let loans: Vec<LoanSummary> = LoanRepo::list(&state.pool, &filter)
        .await?
        .into_iter()
        .map(|loan| LoanSummary::new(loan, today))
        .collect();

    Ok(Json(DataResponse { data: loans }))
}

/// GET /api/v1/loans/{id}
///
/// The loan with its items, penalties and overdue information. Visible to
/// the borrower and to librarians.
pub async fn get_loan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let loan = find_loan(&state, id).await?;
    auth.ensure_access(loan.borrower_id, "loan")?;

    let items = LoanRepo::list_items(&state.pool, id).await?;
    let penalties = PenaltyRepo::list_for_loan(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: LoanDetail {
            summary: LoanSummary::new(loan, today()),
            items,
            penalties,
        },
    }))
}

/// POST /api/v1/loans/{id}/return
///
/// Check the loan in today. The body may record a return condition per
/// loan item; it can be omitted entirely.
pub async fn return_loan(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<ReturnLoan>>,
) -> AppResult<impl IntoResponse> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let mut conditions = Vec::with_capacity(input.conditions.len());
    for mut condition in input.conditions {
        if let Some(note) = validate_condition_note(Some(condition.condition))? {
            condition.condition = note;
            conditions.push(condition);
        }
    }

    let today = today();
    let settlement = circulation::return_loan(
        &state.pool,
        id,
        user.user_id,
        &conditions,
        &state.config.policy,
        today,
    )
    .await?;

    Ok(Json(DataResponse {
        data: SettlementResponse::new(settlement, today),
    }))
}

/// POST /api/v1/loans/{id}/lost
pub async fn declare_lost(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let settlement =
        circulation::declare_lost(&state.pool, id, user.user_id, &state.config.policy).await?;

    Ok(Json(DataResponse {
        data: SettlementResponse::new(settlement, today()),
    }))
}

/// POST /api/v1/loans/{id}/renew
///
/// Push the due date out by one loan period. The borrower or a librarian
/// may renew.
pub async fn renew_loan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let today = today();
    let actor = Actor {
        id: auth.user_id,
        is_librarian: auth.is_librarian(),
    };
    let loan =
        circulation::renew_loan(&state.pool, id, actor, &state.config.policy, today).await?;

    Ok(Json(DataResponse {
        data: LoanSummary::new(loan, today),
    }))
}
