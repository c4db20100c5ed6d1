pub mod admin;
pub mod auth;
pub mod catalog;
pub mod circulation;
pub mod health;
pub mod notifications;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login, /auth/refresh, /auth/logout
///
/// /users                              list (admin), register
/// /users/profile                      caller's account and counters
/// /users/{id}                         get, update, deactivate
/// /users/{id}/password                change or reset password
///
/// /authors, /authors/{id}             catalog (write: librarian)
/// /categories, /categories/{id}
/// /books, /books/{id}
/// /books/{id}/stocks                  stock rows per language
/// /stocks/{id}                        resize, delete
///
/// /loan-requests                      list, submit
/// /loan-requests/{id}                 get
/// /loan-requests/{id}/approve|reject  librarian decision
/// /loan-requests/{id}/cancel          requester withdraws
///
/// /loans, /loans/{id}                 list, detail
/// /loans/{id}/return|lost|renew       check-in, write-off, extension
///
/// /penalties, /penalties/{id}         list, manual penalty, detail
/// /penalties/{id}/pay|waive           settlement (librarian)
///
/// /suspensions, /suspensions/{id}     librarian only
///
/// /notifications                      caller's inbox
/// /audit-logs                         admin only
/// /dashboard/stats, /dashboard/me
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        // Catalog.
        .nest("/authors", catalog::authors_router())
        .nest("/categories", catalog::categories_router())
        .nest("/books", catalog::books_router())
        .nest("/stocks", catalog::stocks_router())
        // Circulation.
        .nest("/loan-requests", circulation::loan_requests_router())
        .nest("/loans", circulation::loans_router())
        .nest("/penalties", circulation::penalties_router())
        .nest("/suspensions", circulation::suspensions_router())
        .nest("/notifications", notifications::router())
        .nest("/audit-logs", admin::audit_router())
        .nest("/dashboard", admin::dashboard_router())
}
