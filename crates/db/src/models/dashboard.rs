//! Aggregate counters for the librarian dashboard and reader profile.

use serde::Serialize;
use sqlx::FromRow;
use biblio_core::types::Date;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LibraryStats {
    pub total_books: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub total_readers: i64,
    pub pending_requests: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub unpaid_penalty_cents: i64,
    pub active_suspensions: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReaderSummary {
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub pending_requests: i64,
    pub unpaid_penalty_cents: i64,
    pub unread_notifications: i64,
    /// End date of the suspension covering today, if any.
    pub suspended_until: Option<Date>,
}
