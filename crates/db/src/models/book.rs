//! Book entity model, DTOs, and catalog search filter.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use biblio_core::types::{DbId, Timestamp};

use crate::models::author::Author;
use crate::models::category::Category;
use crate::models::stock::BookStock;

/// A row from the `books` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Book {
    pub id: DbId,
    pub isbn: Option<String>,
    pub title: String,
    pub cover_url: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Catalog listing row: the book plus its copy counts summed over all
/// languages.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookSummary {
    pub id: DbId,
    pub isbn: Option<String>,
    pub title: String,
    pub cover_url: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<DbId>,
    pub total_copies: i64,
    pub available_copies: i64,
    pub created_at: Timestamp,
}

/// Full book view returned by `GET /books/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub category: Option<Category>,
    pub authors: Vec<Author>,
    pub stocks: Vec<BookStock>,
    pub total_copies: i64,
    pub available_copies: i64,
    pub is_available: bool,
}

impl BookDetail {
    pub fn new(
        book: Book,
        category: Option<Category>,
        authors: Vec<Author>,
        stocks: Vec<BookStock>,
    ) -> Self {
        let total_copies = stocks.iter().map(|s| i64::from(s.total_quantity)).sum();
        let available_copies: i64 = stocks.iter().map(|s| i64::from(s.available_quantity)).sum();
        Self {
            book,
            category,
            authors,
            stocks,
            total_copies,
            available_copies,
            is_available: available_copies > 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBook {
    pub isbn: Option<String>,
    pub title: String,
    pub cover_url: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<DbId>,
    #[serde(default)]
    pub author_ids: Vec<DbId>,
}

/// Partial update. When `author_ids` is present the author list is replaced.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBook {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub cover_url: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<DbId>,
    pub author_ids: Option<Vec<DbId>>,
}

/// Catalog search parameters. All filters are optional and combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    /// Case-insensitive match on title, ISBN, or any author's name.
    pub search: Option<String>,
    pub category_id: Option<DbId>,
    pub author_id: Option<DbId>,
    /// Only books with a stock row in this language.
    pub language: Option<String>,
    /// Only books with at least one copy on the shelf.
    #[serde(default)]
    pub available_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
