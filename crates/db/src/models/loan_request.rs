//! Loan request and request line models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use biblio_core::status::{LoanRequestStatus, StatusId};
use biblio_core::types::{DbId, Timestamp};

/// A row from `loan_requests`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoanRequest {
    pub id: DbId,
    pub requester_id: DbId,
    pub status_id: StatusId,
    /// Librarian who decided the request.
    pub secretary_id: Option<DbId>,
    pub rejection_reason: Option<String>,
    /// Loan created on approval.
    pub loan_id: Option<DbId>,
    pub decision_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LoanRequest {
    pub fn status(&self) -> Option<LoanRequestStatus> {
        LoanRequestStatus::from_id(self.status_id)
    }
}

/// A row from `loan_request_items`. `language = None` means any language.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoanRequestItem {
    pub id: DbId,
    pub loan_request_id: DbId,
    pub book_id: DbId,
    pub language: Option<String>,
    pub quantity: i32,
}

/// A request with its lines and resolved status name.
#[derive(Debug, Clone, Serialize)]
pub struct LoanRequestWithItems {
    #[serde(flatten)]
    pub request: LoanRequest,
    pub status: &'static str,
    pub items: Vec<LoanRequestItem>,
}

impl LoanRequestWithItems {
    pub fn new(request: LoanRequest, items: Vec<LoanRequestItem>) -> Self {
        let status = request.status().map(|s| s.name()).unwrap_or("unknown");
        Self {
            request,
            status,
            items,
        }
    }
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLoanRequestItem {
    pub book_id: DbId,
    pub language: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub items: Vec<CreateLoanRequestItem>,
}

/// List filter. `requester_id` is forced to the caller for readers.
#[derive(Debug, Clone, Default)]
pub struct LoanRequestFilter {
    pub requester_id: Option<DbId>,
    pub status_id: Option<StatusId>,
    pub limit: i64,
    pub offset: i64,
}
