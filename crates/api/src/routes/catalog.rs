//! Route definitions for the catalog: authors, categories, books and stock.
//!
//! Reads require authentication; writes require a librarian.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{authors, books, categories, stocks};
use crate::state::AppState;

/// Routes mounted at `/authors`.
///
/// ```text
/// GET    /      -> list_authors
/// POST   /      -> create_author
/// GET    /{id}  -> get_author
/// PUT    /{id}  -> update_author
/// DELETE /{id}  -> delete_author
/// ```
pub fn authors_router() -> Router<AppState> {
    Router::new()
        .route("/", get(authors::list_authors).post(authors::create_author))
        .route(
            "/{id}",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
}

/// Routes mounted at `/categories`.
pub fn categories_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
}

/// Routes mounted at `/books`.
///
/// ```text
/// GET    /              -> list_books
/// POST   /              -> create_book
/// GET    /{id}          -> get_book
/// PUT    /{id}          -> update_book
/// DELETE /{id}          -> delete_book
/// GET    /{id}/stocks   -> list_stocks
/// POST   /{id}/stocks   -> create_stock
/// ```
pub fn books_router() -> Router<AppState> {
    Router::new()
        .route("/", get(books::list_books).post(books::create_book))
        .route(
            "/{id}",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route(
            "/{id}/stocks",
            get(books::list_stocks).post(books::create_stock),
        )
}

/// Routes mounted at `/stocks`.
pub fn stocks_router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        put(stocks::update_stock).delete(stocks::delete_stock),
    )
}
