//! Per-language stock rows for a book.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use biblio_core::types::{DbId, Timestamp};

/// A row from `book_stocks`. `available_quantity` never exceeds
/// `total_quantity`; the table carries a CHECK constraint for it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookStock {
    pub id: DbId,
    pub book_id: DbId,
    pub language: String,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub condition_note: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New stock row. All copies start on the shelf.
#[derive(Debug, Deserialize)]
pub struct CreateStock {
    pub language: Option<String>,
    pub total_quantity: i32,
    pub condition_note: Option<String>,
}

/// Resize a stock row or change its condition note.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStock {
    pub total_quantity: Option<i32>,
    pub condition_note: Option<String>,
}
