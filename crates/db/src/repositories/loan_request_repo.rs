//! Repository for the `loan_requests` and `loan_request_items` tables.

use sqlx::{PgExecutor, PgPool};
use biblio_core::status::LoanRequestStatus;
use biblio_core::types::DbId;

use crate::models::loan_request::{
    CreateLoanRequestItem, LoanRequest, LoanRequestFilter, LoanRequestItem,
};

const COLUMNS: &str = "id, requester_id, status_id, secretary_id, rejection_reason, loan_id, \
                        decision_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, loan_request_id, book_id, language, quantity";

pub struct LoanRequestRepo;

impl LoanRequestRepo {
    /// Insert a pending request with no lines.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        requester_id: DbId,
    ) -> Result<LoanRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO loan_requests (requester_id, status_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoanRequest>(&query)
            .bind(requester_id)
            .bind(LoanRequestStatus::Pending.id())
            .fetch_one(executor)
            .await
    }

    pub async fn add_item(
        executor: impl PgExecutor<'_>,
        loan_request_id: DbId,
        item: &CreateLoanRequestItem,
    ) -> Result<LoanRequestItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO loan_request_items (loan_request_id, book_id, language, quantity)
             VALUES ($1, $2, $3, $4)
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, LoanRequestItem>(&query)
            .bind(loan_request_id)
            .bind(item.book_id)
            .bind(&item.language)
            .bind(item.quantity)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<LoanRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loan_requests WHERE id = $1");
        sqlx::query_as::<_, LoanRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<LoanRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loan_requests WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, LoanRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lines of one request, in book order so stock locks are taken in a
    /// stable order.
    pub async fn list_items(
        executor: impl PgExecutor<'_>,
        loan_request_id: DbId,
    ) -> Result<Vec<LoanRequestItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM loan_request_items
             WHERE loan_request_id = $1
             ORDER BY book_id, id"
        );
        sqlx::query_as::<_, LoanRequestItem>(&query)
            .bind(loan_request_id)
            .fetch_all(executor)
            .await
    }

    /// Lines of several requests at once, for list views.
    pub async fn list_items_for_requests(
        pool: &PgPool,
        request_ids: &[DbId],
    ) -> Result<Vec<LoanRequestItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM loan_request_items
             WHERE loan_request_id = ANY($1)
             ORDER BY loan_request_id, book_id, id"
        );
        sqlx::query_as::<_, LoanRequestItem>(&query)
            .bind(request_ids)
            .fetch_all(pool)
            .await
    }

    /// List requests, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &LoanRequestFilter,
    ) -> Result<Vec<LoanRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM loan_requests
             WHERE ($1::BIGINT IS NULL OR requester_id = $1)
               AND ($2::SMALLINT IS NULL OR status_id = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, LoanRequest>(&query)
            .bind(filter.requester_id)
            .bind(filter.status_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    pub async fn mark_approved(
        executor: impl PgExecutor<'_>,
        id: DbId,
        secretary_id: DbId,
        loan_id: DbId,
    ) -> Result<LoanRequest, sqlx::Error> {
        let query = format!(
            "UPDATE loan_requests SET
                status_id = $2,
                secretary_id = $3,
                loan_id = $4,
                decision_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoanRequest>(&query)
            .bind(id)
            .bind(LoanRequestStatus::Approved.id())
            .bind(secretary_id)
            .bind(loan_id)
            .fetch_one(executor)
            .await
    }

    pub async fn mark_rejected(
        executor: impl PgExecutor<'_>,
        id: DbId,
        secretary_id: DbId,
        reason: &str,
    ) -> Result<LoanRequest, sqlx::Error> {
        let query = format!(
            "UPDATE loan_requests SET
                status_id = $2,
                secretary_id = $3,
                rejection_reason = $4,
                decision_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoanRequest>(&query)
            .bind(id)
            .bind(LoanRequestStatus::Rejected.id())
            .bind(secretary_id)
            .bind(reason)
            .fetch_one(executor)
            .await
    }

    pub async fn mark_canceled(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<LoanRequest, sqlx::Error> {
        let query = format!(
            "UPDATE loan_requests SET status_id = $2, decision_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoanRequest>(&query)
            .bind(id)
            .bind(LoanRequestStatus::Canceled.id())
            .fetch_one(executor)
            .await
    }
}
