//! Handlers for `/stocks/{id}`: resizing and removing a stock row.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::types::DbId;
use biblio_db::circulation;
use biblio_db::models::stock::UpdateStock;

use crate::error::AppResult;
use crate::handlers::books::validate_condition_note;
use crate::middleware::rbac::RequireLibrarian;
use crate::response::DataResponse;
use crate::state::AppState;

/// PUT /api/v1/stocks/{id}
///
/// Change the total number of copies and/or the condition note. The copies
/// currently on loan stay on loan, so the total cannot drop below them.
pub async fn update_stock(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStock>,
) -> AppResult<impl IntoResponse> {
    let update = UpdateStock {
        total_quantity: input.total_quantity,
        condition_note: validate_condition_note(input.condition_note)?,
    };

    let stock = circulation::update_stock(&state.pool, id, &update, user.user_id).await?;
    tracing::info!(
        stock_id = id,
        total = stock.total_quantity,
        available = stock.available_quantity,
        "Stock row updated"
    );

    Ok(Json(DataResponse { data: stock }))
}

/// DELETE /api/v1/stocks/{id}
///
/// Only rows that were never lent can be removed (409 otherwise). Returns 204.
pub async fn delete_stock(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    circulation::delete_stock(&state.pool, id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
