//! Loan request and loan lifecycle rules.
//!
//! The `db::circulation` workflow calls these before writing anything, so a
//! rule violation aborts the surrounding transaction untouched.

use std::collections::HashSet;

use chrono::Duration;

use crate::error::CoreError;
use crate::status::{LoanRequestStatus, LoanStatus};
use crate::types::{Date, DbId};

/// Maximum number of distinct lines in a single loan request.
pub const MAX_ITEMS_PER_REQUEST: usize = 10;

/// Maximum copies of one book a single line may ask for.
pub const MAX_QUANTITY_PER_ITEM: i32 = 5;

/// Maximum length of a rejection reason.
pub const MAX_REASON_LENGTH: usize = 255;

/// Tunable circulation rules, loaded from the environment by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CirculationPolicy {
    /// Days between issue and due date.
    pub loan_duration_days: i64,
    /// How many times an active loan may be extended.
    pub max_renewals: i32,
    /// Active loans a reader may hold before new requests are refused.
    pub max_active_loans: i64,
    /// Late fee per day, in cents.
    pub late_fee_cents_per_day: i64,
    /// Flat fee per lost copy, in cents.
    pub lost_item_fee_cents: i64,
    /// Send a due reminder this many days before the due date.
    pub due_reminder_days: i64,
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        Self {
            loan_duration_days: 14,
            max_renewals: 2,
            max_active_loans: 5,
            late_fee_cents_per_day: 50,
            lost_item_fee_cents: 2_500,
            due_reminder_days: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Loan requests
// ---------------------------------------------------------------------------

/// Check a loan request status transition.
///
/// Only pending requests can be decided; a decided request is final.
pub fn ensure_request_transition(
    from: LoanRequestStatus,
    to: LoanRequestStatus,
) -> Result<(), CoreError> {
    if from != LoanRequestStatus::Pending {
        return Err(CoreError::Conflict(format!(
            "Loan request has already been processed (status: {from})"
        )));
    }
    if to == LoanRequestStatus::Pending {
        return Err(CoreError::Conflict(
            "Loan request is already pending".to_string(),
        ));
    }
    Ok(())
}

/// Validate the lines of a new loan request.
///
/// Each line is `(book_id, language, quantity)`. A book may appear more than
/// once only with different languages.
pub fn validate_request_items<'a, I>(lines: I) -> Result<(), CoreError>
where
    I: IntoIterator<Item = (DbId, Option<&'a str>, i32)>,
{
    let mut seen = HashSet::new();
    let mut count = 0usize;

    for (book_id, language, quantity) in lines {
        count += 1;
        if quantity < 1 || quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CoreError::Validation(format!(
                "Quantity for book {book_id} must be between 1 and {MAX_QUANTITY_PER_ITEM}"
            )));
        }
        if !seen.insert((book_id, language)) {
            return Err(CoreError::Validation(format!(
                "Book {book_id} appears more than once in the request"
            )));
        }
    }

    if count == 0 {
        return Err(CoreError::Validation(
            "A loan request must contain at least one book".to_string(),
        ));
    }
    if count > MAX_ITEMS_PER_REQUEST {
        return Err(CoreError::Validation(format!(
            "A loan request may contain at most {MAX_ITEMS_PER_REQUEST} books"
        )));
    }
    Ok(())
}

/// Validate and normalize a rejection reason.
pub fn validate_rejection_reason(reason: &str) -> Result<String, CoreError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "A rejection reason is required".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Rejection reason exceeds {MAX_REASON_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

/// Due date for a loan issued on `loan_date`.
pub fn due_date(loan_date: Date, duration_days: i64) -> Date {
    loan_date + Duration::days(duration_days)
}

/// Whole days between `due` and `returned`; zero when returned on time.
pub fn days_late(due: Date, returned: Date) -> i64 {
    (returned - due).num_days().max(0)
}

/// An active loan past its due date.
pub fn is_overdue(status: LoanStatus, due: Date, today: Date) -> bool {
    status == LoanStatus::Active && due < today
}

/// Days an active loan is overdue as of `today`.
pub fn days_overdue(status: LoanStatus, due: Date, today: Date) -> i64 {
    if is_overdue(status, due, today) {
        days_late(due, today)
    } else {
        0
    }
}

/// Late-return fee in cents.
pub fn late_return_penalty_cents(days_late: i64, rate_cents_per_day: i64) -> i64 {
    days_late.max(0) * rate_cents_per_day.max(0)
}

/// Final status of a loan returned on `returned`.
pub fn return_status(due: Date, returned: Date) -> LoanStatus {
    if returned > due {
        LoanStatus::LateReturned
    } else {
        LoanStatus::Returned
    }
}

/// Reject any operation that needs an active loan.
pub fn ensure_loan_active(status: LoanStatus) -> Result<(), CoreError> {
    if status != LoanStatus::Active {
        return Err(CoreError::Conflict(format!(
            "Loan is not active (status: {status})"
        )));
    }
    Ok(())
}

/// Check whether a loan may be renewed today.
pub fn ensure_renewable(
    status: LoanStatus,
    due: Date,
    today: Date,
    renewal_count: i32,
    max_renewals: i32,
) -> Result<(), CoreError> {
    ensure_loan_active(status)?;
    if is_overdue(status, due, today) {
        return Err(CoreError::Conflict(
            "Overdue loans cannot be renewed".to_string(),
        ));
    }
    if renewal_count >= max_renewals {
        return Err(CoreError::Conflict(format!(
            "Loan has reached the maximum of {max_renewals} renewals"
        )));
    }
    Ok(())
}
