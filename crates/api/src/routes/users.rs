//! Route definitions for the `/users` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /                -> list_users (admin)
/// POST   /                -> register (public; admin may set role)
/// GET    /profile         -> profile
/// GET    /{id}            -> get_user
/// PUT    /{id}            -> update_user
/// DELETE /{id}            -> deactivate_user (admin)
/// PUT    /{id}/password   -> change_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::register))
        .route("/profile", get(users::profile))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::deactivate_user),
        )
        .route("/{id}/password", put(users::change_password))
}
