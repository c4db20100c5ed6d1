//! Handlers for the `/books` resource and its per-language stock rows.
//!
//! Reads require authentication; writes require a librarian. Catalog fields
//! are validated and normalized here (ISBN stripped of separators, language
//! codes lowercased) before reaching the repositories.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::audit::{actions, entities};
use biblio_core::catalog::{
    normalize_isbn, validate_language, validate_name, validate_publication_year,
    DEFAULT_LANGUAGE, MAX_PUBLISHER_LENGTH, MAX_TITLE_LENGTH,
};
use biblio_core::error::CoreError;
use biblio_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use biblio_core::types::DbId;
use biblio_db::models::audit::CreateAuditLog;
use biblio_db::models::book::{BookDetail, BookFilter, CreateBook, UpdateBook};
use biblio_db::models::stock::CreateStock;
use biblio_db::repositories::{AuthorRepo, BookRepo, CategoryRepo, StockRepo};
use chrono::Datelike;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::{record_audit, today};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireLibrarian;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum length of a stock row's condition note.
pub(crate) const MAX_CONDITION_NOTE_LENGTH: usize = 255;

// ---------------------------------------------------------------------------
// Books
// ---------------------------------------------------------------------------

/// GET /api/v1/books
///
/// Catalog search: `search`, `category_id`, `author_id`, `language`,
/// `available_only`, `limit`, `offset`.
pub async fn list_books(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<BookFilter>,
) -> AppResult<impl IntoResponse> {
    filter.search = filter
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    filter.language = filter
        .language
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty());

    let limit = clamp_limit(filter.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(filter.offset);

    let books = BookRepo::search(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse { data: books }))
}

/// GET /api/v1/books/{id}
///
/// The book with its category, authors, stock rows and availability.
pub async fn get_book(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = load_detail(&state, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/books
pub async fn create_book(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Json(input): Json<CreateBook>,
) -> AppResult<impl IntoResponse> {
    let title = validate_name("Title", &input.title, MAX_TITLE_LENGTH)?;
    let isbn = input.isbn.as_deref().map(normalize_isbn).transpose()?;
    let publisher = normalize_publisher(input.publisher)?;
    if let Some(year) = input.publication_year {
        validate_publication_year(year, today().year())?;
    }
    ensure_category_exists(&state, input.category_id).await?;
    let author_ids = dedup_ids(input.author_ids);
    ensure_authors_exist(&state, &author_ids).await?;

    let book = BookRepo::create(
        &state.pool,
        &CreateBook {
            isbn,
            title,
            cover_url: blank_to_none(input.cover_url),
            summary: blank_to_none(input.summary),
            publisher,
            publication_year: input.publication_year,
            category_id: input.category_id,
            author_ids,
        },
    )
    .await?;

    record_audit(
        &state,
        CreateAuditLog::new(Some(user.user_id), actions::ENTITY_CREATE, entities::BOOK, book.id)
            .with_new(json!(book)),
    )
    .await;
    tracing::info!(book_id = book.id, title = %book.title, "Book created");

    let detail = load_detail(&state, book.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// PUT /api/v1/books/{id}
///
/// Partial update. A present `author_ids` replaces the author list.
pub async fn update_book(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBook>,
) -> AppResult<impl IntoResponse> {
    let existing = BookRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Book", id }))?;

    let title = input
        .title
        .as_deref()
        .map(|t| validate_name("Title", t, MAX_TITLE_LENGTH))
        .transpose()?;
    let isbn = input.isbn.as_deref().map(normalize_isbn).transpose()?;
    let publisher = normalize_publisher(input.publisher)?;
    if let Some(year) = input.publication_year {
        validate_publication_year(year, today().year())?;
    }
    ensure_category_exists(&state, input.category_id).await?;
    let author_ids = input.author_ids.map(dedup_ids);
    if let Some(ids) = &author_ids {
        ensure_authors_exist(&state, ids).await?;
    }

    let book = BookRepo::update(
        &state.pool,
        id,
        &UpdateBook {
            isbn,
            title,
            cover_url: input.cover_url,
            summary: input.summary,
            publisher,
            publication_year: input.publication_year,
            category_id: input.category_id,
            author_ids,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Book", id }))?;

    record_audit(
        &state,
        CreateAuditLog::new(Some(user.user_id), actions::ENTITY_UPDATE, entities::BOOK, id)
            .with_old(json!(existing))
            .with_new(json!(book)),
    )
    .await;

    let detail = load_detail(&state, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /api/v1/books/{id}
///
/// Fails with 409 once any copy has been lent. Returns 204.
pub async fn delete_book(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !BookRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Book", id }));
    }

    record_audit(
        &state,
        CreateAuditLog::new(Some(user.user_id), actions::ENTITY_DELETE, entities::BOOK, id),
    )
    .await;
    tracing::info!(book_id = id, "Book deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Stock rows
// ---------------------------------------------------------------------------

/// GET /api/v1/books/{id}/stocks
pub async fn list_stocks(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_book_exists(&state, book_id).await?;
    let stocks = StockRepo::list_for_book(&state.pool, book_id).await?;
    Ok(Json(DataResponse { data: stocks }))
}

/// POST /api/v1/books/{id}/stocks
///
/// Add the copies of one language. Every copy starts on the shelf. A second
/// row for the same language is a 409; resize the existing row instead.
pub async fn create_stock(
    RequireLibrarian(user): RequireLibrarian,
    State(state): State<AppState>,
    Path(book_id): Path<DbId>,
    Json(input): Json<CreateStock>,
) -> AppResult<impl IntoResponse> {
    ensure_book_exists(&state, book_id).await?;

    let language = match input.language.as_deref().map(str::trim) {
        Some(l) if !l.is_empty() => l.to_lowercase(),
        _ => DEFAULT_LANGUAGE.to_string(),
    };
    validate_language(&language)?;
    if input.total_quantity < 0 {
        return Err(AppError::Core(CoreError::Validation(
            "Total quantity must not be negative".into(),
        )));
    }
    let note = validate_condition_note(input.condition_note)?;

    let stock = StockRepo::create(
        &state.pool,
        book_id,
        &language,
        input.total_quantity,
        note.as_deref(),
    )
    .await?;

    record_audit(
        &state,
        CreateAuditLog::new(
            Some(user.user_id),
            actions::ENTITY_CREATE,
            entities::BOOK_STOCK,
            stock.id,
        )
        .with_new(json!(stock)),
    )
    .await;
    tracing::info!(stock_id = stock.id, book_id, language = %stock.language, "Stock row created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: stock })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_detail(state: &AppState, id: DbId) -> AppResult<BookDetail> {
    let book = BookRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Book", id }))?;

    let category = match book.category_id {
        Some(category_id) => CategoryRepo::find_by_id(&state.pool, category_id).await?,
        None => None,
    };
    let authors = AuthorRepo::list_for_book(&state.pool, id).await?;
    let stocks = StockRepo::list_for_book(&state.pool, id).await?;

    Ok(BookDetail::new(book, category, authors, stocks))
}

async fn ensure_book_exists(state: &AppState, id: DbId) -> AppResult<()> {
    BookRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Book", id }))?;
    Ok(())
}

async fn ensure_category_exists(state: &AppState, category_id: Option<DbId>) -> AppResult<()> {
    if let Some(id) = category_id {
        if CategoryRepo::find_by_id(&state.pool, id).await?.is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Category {id} does not exist"
            ))));
        }
    }
    Ok(())
}

async fn ensure_authors_exist(state: &AppState, ids: &[DbId]) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = AuthorRepo::count_existing(&state.pool, ids).await?;
    if found != ids.len() as i64 {
        return Err(AppError::Core(CoreError::Validation(
            "One or more authors do not exist".into(),
        )));
    }
    Ok(())
}

fn dedup_ids(mut ids: Vec<DbId>) -> Vec<DbId> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_publisher(publisher: Option<String>) -> Result<Option<String>, CoreError> {
    blank_to_none(publisher)
        .map(|p| validate_name("Publisher", &p, MAX_PUBLISHER_LENGTH))
        .transpose()
}

pub(crate) fn validate_condition_note(note: Option<String>) -> Result<Option<String>, CoreError> {
    let note = blank_to_none(note);
    if let Some(n) = &note {
        if n.chars().count() > MAX_CONDITION_NOTE_LENGTH {
            return Err(CoreError::Validation(format!(
                "Condition note exceeds {MAX_CONDITION_NOTE_LENGTH} characters"
            )));
        }
    }
    Ok(note)
}
