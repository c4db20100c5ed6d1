//! Route definitions for loan requests, loans, penalties and suspensions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{loan_requests, loans, penalties, suspensions};
use crate::state::AppState;

/// Routes mounted at `/loan-requests`.
///
/// ```text
/// GET    /               -> list_requests (own, or all for librarians)
/// POST   /               -> create_request
/// GET    /{id}           -> get_request
/// POST   /{id}/approve   -> approve_request (librarian)
/// POST   /{id}/reject    -> reject_request (librarian)
/// POST   /{id}/cancel    -> cancel_request (requester)
/// ```
pub fn loan_requests_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(loan_requests::list_requests).post(loan_requests::create_request),
        )
        .route("/{id}", get(loan_requests::get_request))
        .route("/{id}/approve", post(loan_requests::approve_request))
        .route("/{id}/reject", post(loan_requests::reject_request))
        .route("/{id}/cancel", post(loan_requests::cancel_request))
}

/// Routes mounted at `/loans`.
///
/// ```text
/// GET    /              -> list_loans
/// GET    /{id}          -> get_loan
/// POST   /{id}/return   -> return_loan (librarian)
/// POST   /{id}/lost     -> declare_lost (librarian)
/// POST   /{id}/renew    -> renew_loan (borrower or librarian)
/// ```
pub fn loans_router() -> Router<AppState> {
    Router::new()
        .route("/", get(loans::list_loans))
        .route("/{id}", get(loans::get_loan))
        .route("/{id}/return", post(loans::return_loan))
        .route("/{id}/lost", post(loans::declare_lost))
        .route("/{id}/renew", post(loans::renew_loan))
}

/// Routes mounted at `/penalties`.
///
/// ```text
/// GET    /             -> list_penalties
/// POST   /             -> create_penalty (librarian)
/// GET    /{id}         -> get_penalty
/// POST   /{id}/pay     -> pay_penalty (librarian)
/// POST   /{id}/waive   -> waive_penalty (librarian)
/// ```
pub fn penalties_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(penalties::list_penalties).post(penalties::create_penalty),
        )
        .route("/{id}", get(penalties::get_penalty))
        .route("/{id}/pay", post(penalties::pay_penalty))
        .route("/{id}/waive", post(penalties::waive_penalty))
}

/// Routes mounted at `/suspensions`. Librarians only.
pub fn suspensions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(suspensions::list_suspensions).post(suspensions::create_suspension),
        )
        .route(
            "/{id}",
            get(suspensions::get_suspension).delete(suspensions::delete_suspension),
        )
}
