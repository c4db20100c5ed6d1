//! Loan and loan item models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use biblio_core::circulation;
use biblio_core::status::{LoanStatus, StatusId};
use biblio_core::types::{Date, DbId, Timestamp};

use crate::models::penalty::Penalty;

/// A row from `loans`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Loan {
    pub id: DbId,
    pub borrower_id: DbId,
    /// Librarian who issued the loan.
    pub secretary_id: Option<DbId>,
    pub status_id: StatusId,
    pub loan_date: Date,
    pub due_date: Date,
    pub return_date: Option<Date>,
    pub renewal_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Loan {
    pub fn status(&self) -> Option<LoanStatus> {
        LoanStatus::from_id(self.status_id)
    }
}

/// A loan item joined with its stock row and book title.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoanItem {
    pub id: DbId,
    pub loan_id: DbId,
    pub stock_id: DbId,
    pub book_id: DbId,
    pub title: String,
    pub language: String,
    pub quantity: i32,
    pub condition_out: Option<String>,
    pub condition_in: Option<String>,
}

/// Loan view with derived overdue information.
#[derive(Debug, Clone, Serialize)]
pub struct LoanSummary {
    #[serde(flatten)]
    pub loan: Loan,
    pub status: &'static str,
    pub is_overdue: bool,
    pub days_overdue: i64,
}

impl LoanSummary {
    pub fn new(loan: Loan, today: Date) -> Self {
        let (status, is_overdue, days_overdue) = match loan.status() {
            Some(s) => (
                s.name(),
                circulation::is_overdue(s, loan.due_date, today),
                circulation::days_overdue(s, loan.due_date, today),
            ),
            None => ("unknown", false, 0),
        };
        Self {
            loan,
            status,
            is_overdue,
            days_overdue,
        }
    }
}

/// Full loan view returned by `GET /loans/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct LoanDetail {
    #[serde(flatten)]
    pub summary: LoanSummary,
    pub items: Vec<LoanItem>,
    pub penalties: Vec<Penalty>,
}

/// Loan row inserted by the approval workflow.
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub borrower_id: DbId,
    pub secretary_id: DbId,
    pub loan_date: Date,
    pub due_date: Date,
}

/// Condition recorded for one loan item at check-in.
#[derive(Debug, Clone, Deserialize)]
pub struct ReturnItemCondition {
    pub loan_item_id: DbId,
    pub condition: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReturnLoan {
    #[serde(default)]
    pub conditions: Vec<ReturnItemCondition>,
}

/// List filter. `borrower_id` is forced to the caller for readers.
#[derive(Debug, Clone)]
pub struct LoanFilter {
    pub borrower_id: Option<DbId>,
    pub status_id: Option<StatusId>,
    /// Only active loans whose due date is before `today`.
    pub overdue_only: bool,
    pub today: Date,
    pub limit: i64,
    pub offset: i64,
}
