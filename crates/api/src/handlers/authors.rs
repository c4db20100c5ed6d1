//! Handlers for the `/authors` resource.
//!
//! Reads require authentication; writes require a librarian.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::audit::{actions, entities};
use biblio_core::catalog::{validate_life_dates, validate_name, MAX_AUTHOR_NAME_LENGTH};
use biblio_core::error::CoreError;
use biblio_core::types::DbId;
use biblio_db::models::audit::CreateAuditLog;
use biblio_db::models::author::{CreateAuthor, UpdateAuthor};
use biblio_db::repositories::AuthorRepo;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireLibrarian;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /authors`.
#[derive(Debug, Deserialize)]
pub struct AuthorListParams {
    /// Case-insensitive substring of the full name.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/authors
pub async fn list_authors(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AuthorListParams>,
) -> AppResult<impl IntoResponse> {
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let authors = AuthorRepo::list(&state.pool, search, page.limit(), page.offset()).await?;
    Ok(Json(DataResponse { data: authors }))
}

/// GET /api/v1/authors/{id}
pub async fn get_author(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let author = AuthorRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Author",
            id,
        }))?;
    Ok(Json(DataResponse { data: author }))
}

/// POST /api/v1/authors
pub async fn create_author(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Json(input): Json<CreateAuthor>,
) -> AppResult<impl IntoResponse> {
    let full_name = validate_name("Full name", &input.full_name, MAX_AUTHOR_NAME_LENGTH)?;
    validate_life_dates(input.birth_date, input.death_date)?;

    let author = AuthorRepo::create(
        &state.pool,
        &CreateAuthor {
            full_name,
            ..input
        },
    )
    .await?;

    record_audit(
        &state,
        CreateAuditLog::new(
            Some(user.user_id),
            actions::ENTITY_CREATE,
            entities::AUTHOR,
            author.id,
        )
        .with_new(json!(author)),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: author })))
}

/// PUT /api/v1/authors/{id}
///
/// Partial update. Life dates are checked against the merged record.
pub async fn update_author(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAuthor>,
) -> AppResult<impl IntoResponse> {
    let existing = AuthorRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Author",
            id,
        }))?;

    let full_name = input
        .full_name
        .as_deref()
        .map(|n| validate_name("Full name", n, MAX_AUTHOR_NAME_LENGTH))
        .transpose()?;
    validate_life_dates(
        input.birth_date.or(existing.birth_date),
        input.death_date.or(existing.death_date),
    )?;

    let author = AuthorRepo::update(
        &state.pool,
        id,
        &UpdateAuthor {
            full_name,
            ..input
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Author",
        id,
    }))?;

    record_audit(
        &state,
        CreateAuditLog::new(Some(user.user_id), actions::ENTITY_UPDATE, entities::AUTHOR, id)
            .with_old(json!(existing))
            .with_new(json!(author)),
    )
    .await;

    Ok(Json(DataResponse { data: author }))
}

/// DELETE /api/v1/authors/{id}
///
/// Book links are removed with the author; the books stay. Returns 204.
pub async fn delete_author(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !AuthorRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Author",
            id,
        }));
    }

    record_audit(
        &state,
        CreateAuditLog::new(Some(user.user_id), actions::ENTITY_DELETE, entities::AUTHOR, id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
