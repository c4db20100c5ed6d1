//! Suspension model and DTO.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use biblio_core::types::{Date, DbId, Timestamp};

/// A row from `suspensions`. Both dates are inclusive.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Suspension {
    pub id: DbId,
    pub user_id: DbId,
    pub start_date: Date,
    pub end_date: Date,
    pub reason: String,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateSuspension {
    pub user_id: DbId,
    /// Defaults to today.
    pub start_date: Option<Date>,
    pub end_date: Date,
    pub reason: String,
}
