//! Aggregate queries for dashboards.

use sqlx::PgPool;
use biblio_core::roles::ROLE_READER;
use biblio_core::status::{LoanRequestStatus, LoanStatus, PaymentStatus};
use biblio_core::types::{Date, DbId};

use crate::models::dashboard::{LibraryStats, ReaderSummary};

pub struct DashboardRepo;

impl DashboardRepo {
    /// Library-wide counters as of `today`.
    pub async fn library_stats(pool: &PgPool, today: Date) -> Result<LibraryStats, sqlx::Error> {
        sqlx::query_as::<_, LibraryStats>(
            "SELECT
                (SELECT COUNT(*) FROM books) AS total_books,
                (SELECT COALESCE(SUM(total_quantity), 0)::BIGINT FROM book_stocks) AS total_copies,
                (SELECT COALESCE(SUM(available_quantity), 0)::BIGINT FROM book_stocks) AS available_copies,
                (SELECT COUNT(*) FROM users WHERE role = $1 AND is_active) AS total_readers,
                (SELECT COUNT(*) FROM loan_requests WHERE status_id = $2) AS pending_requests,
                (SELECT COUNT(*) FROM loans WHERE status_id = $3) AS active_loans,
                (SELECT COUNT(*) FROM loans WHERE status_id = $3 AND due_date < $5) AS overdue_loans,
                (SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM penalties
                  WHERE payment_status_id = $4) AS unpaid_penalty_cents,
                (SELECT COUNT(DISTINCT user_id) FROM suspensions
                  WHERE start_date <= $5 AND end_date >= $5) AS active_suspensions",
        )
        .bind(ROLE_READER)
        .bind(LoanRequestStatus::Pending.id())
        .bind(LoanStatus::Active.id())
        .bind(PaymentStatus::Unpaid.id())
        .bind(today)
        .fetch_one(pool)
        .await
    }

    /// Personal counters for one user as of `today`.
    pub async fn reader_summary(
        pool: &PgPool,
        user_id: DbId,
        today: Date,
    ) -> Result<ReaderSummary, sqlx::Error> {
        sqlx::query_as::<_, ReaderSummary>(
            "SELECT
                (SELECT COUNT(*) FROM loans
                  WHERE borrower_id = $1 AND status_id = $2) AS active_loans,
                (SELECT COUNT(*) FROM loans
                  WHERE borrower_id = $1 AND status_id = $2 AND due_date < $5) AS overdue_loans,
                (SELECT COUNT(*) FROM loan_requests
                  WHERE requester_id = $1 AND status_id = $3) AS pending_requests,
                (SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM penalties
                  WHERE user_id = $1 AND payment_status_id = $4) AS unpaid_penalty_cents,
                (SELECT COUNT(*) FROM notifications
                  WHERE user_id = $1 AND read_at IS NULL) AS unread_notifications,
                (SELECT MAX(end_date) FROM suspensions
                  WHERE user_id = $1 AND start_date <= $5 AND end_date >= $5) AS suspended_until",
        )
        .bind(user_id)
        .bind(LoanStatus::Active.id())
        .bind(LoanRequestStatus::Pending.id())
        .bind(PaymentStatus::Unpaid.id())
        .bind(today)
        .fetch_one(pool)
        .await
    }
}
