//! Penalty model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use biblio_core::status::StatusId;
use biblio_core::types::{DbId, Timestamp};

/// A row from `penalties`. Amounts are integer cents.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Penalty {
    pub id: DbId,
    pub user_id: DbId,
    pub loan_id: Option<DbId>,
    pub reason_id: StatusId,
    pub days_late: Option<i32>,
    pub amount_cents: i64,
    pub note: Option<String>,
    pub payment_status_id: StatusId,
    /// Librarian who marked the penalty paid or waived.
    pub validated_by: Option<DbId>,
    pub validated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewPenalty {
    pub user_id: DbId,
    pub loan_id: Option<DbId>,
    pub reason_id: StatusId,
    pub days_late: Option<i32>,
    pub amount_cents: i64,
    pub note: Option<String>,
}

/// Manual penalty entered by a librarian (e.g. a damaged copy).
#[derive(Debug, Deserialize)]
pub struct CreatePenalty {
    pub user_id: DbId,
    pub loan_id: Option<DbId>,
    /// `late_return`, `lost_item`, or `damaged_item`; defaults to `damaged_item`.
    pub reason: Option<String>,
    pub amount_cents: i64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PenaltyFilter {
    pub user_id: Option<DbId>,
    pub payment_status_id: Option<StatusId>,
    pub limit: i64,
    pub offset: i64,
}
