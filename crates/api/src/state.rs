use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (the pool is reference counted and the config is
/// behind an `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: biblio_db::DbPool,
    /// Server configuration, including JWT settings and the circulation policy.
    pub config: Arc<ServerConfig>,
}
