//! Handlers for the `/categories` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::audit::{actions, entities};
use biblio_core::catalog::{validate_name, MAX_CATEGORY_NAME_LENGTH};
use biblio_core::error::CoreError;
use biblio_core::types::DbId;
use biblio_db::models::audit::CreateAuditLog;
use biblio_db::models::category::{CreateCategory, UpdateCategory};
use biblio_db::repositories::CategoryRepo;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireLibrarian;
use crate::response::DataResponse;
use crate::state::AppState;

/// Blank descriptions are stored as NULL.
fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// GET /api/v1/categories
///
/// All categories by name. The list is small, so it is not paginated.
pub async fn list_categories(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let categories = CategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/v1/categories/{id}
pub async fn get_category(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))?;
    Ok(Json(DataResponse { data: category }))
}

/// POST /api/v1/categories
pub async fn create_category(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<impl IntoResponse> {
    let category = CategoryRepo::create(
        &state.pool,
        &CreateCategory {
            name: validate_name("Name", &input.name, MAX_CATEGORY_NAME_LENGTH)?,
            description: normalize_description(input.description),
        },
    )
    .await?;

    record_audit(
        &state,
        CreateAuditLog::new(
            Some(user.user_id),
            actions::ENTITY_CREATE,
            entities::CATEGORY,
            category.id,
        )
        .with_new(json!(category)),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<impl IntoResponse> {
    let update = UpdateCategory {
        name: input
            .name
            .as_deref()
            .map(|n| validate_name("Name", n, MAX_CATEGORY_NAME_LENGTH))
            .transpose()?,
        description: normalize_description(input.description),
    };

    let category = CategoryRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))?;

    record_audit(
        &state,
        CreateAuditLog::new(
            Some(user.user_id),
            actions::ENTITY_UPDATE,
            entities::CATEGORY,
            id,
        )
        .with_new(json!(category)),
    )
    .await;

    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/categories/{id}
///
/// Books in the category become uncategorized. Returns 204.
pub async fn delete_category(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !CategoryRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }));
    }

    record_audit(
        &state,
        CreateAuditLog::new(
            Some(user.user_id),
            actions::ENTITY_DELETE,
            entities::CATEGORY,
            id,
        ),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
