//! Author entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use biblio_core::types::{Date, DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Author {
    pub id: DbId,
    pub full_name: String,
    pub birth_date: Option<Date>,
    pub death_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateAuthor {
    pub full_name: String,
    pub birth_date: Option<Date>,
    pub death_date: Option<Date>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAuthor {
    pub full_name: Option<String>,
    pub birth_date: Option<Date>,
    pub death_date: Option<Date>,
}
