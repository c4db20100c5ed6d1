//! Repository for the `penalties` table.

use sqlx::{PgExecutor, PgPool};
use biblio_core::status::{PaymentStatus, StatusId};
use biblio_core::types::DbId;

use crate::models::penalty::{NewPenalty, Penalty, PenaltyFilter};

const COLUMNS: &str = "id, user_id, loan_id, reason_id, days_late, amount_cents, note, \
                        payment_status_id, validated_by, validated_at, created_at, updated_at";

pub struct PenaltyRepo;

impl PenaltyRepo {
    /// Insert an unpaid penalty.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewPenalty,
    ) -> Result<Penalty, sqlx::Error> {
        let query = format!(
            "INSERT INTO penalties (user_id, loan_id, reason_id, days_late, amount_cents, note, payment_status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Penalty>(&query)
            .bind(input.user_id)
            .bind(input.loan_id)
            .bind(input.reason_id)
            .bind(input.days_late)
            .bind(input.amount_cents)
            .bind(&input.note)
            .bind(PaymentStatus::Unpaid.id())
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Penalty>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM penalties WHERE id = $1");
        sqlx::query_as::<_, Penalty>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Penalty>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM penalties WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Penalty>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_loan(
        executor: impl PgExecutor<'_>,
        loan_id: DbId,
    ) -> Result<Vec<Penalty>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM penalties WHERE loan_id = $1 ORDER BY id");
        sqlx::query_as::<_, Penalty>(&query)
            .bind(loan_id)
            .fetch_all(executor)
            .await
    }

    /// List penalties, newest first.
    pub async fn list(pool: &PgPool, filter: &PenaltyFilter) -> Result<Vec<Penalty>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM penalties
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::SMALLINT IS NULL OR payment_status_id = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Penalty>(&query)
            .bind(filter.user_id)
            .bind(filter.payment_status_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Record settlement (`paid` or `waived`) by a librarian.
    pub async fn settle(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: PaymentStatus,
        validated_by: DbId,
    ) -> Result<Penalty, sqlx::Error> {
        let query = format!(
            "UPDATE penalties SET
                payment_status_id = $2,
                validated_by = $3,
                validated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Penalty>(&query)
            .bind(id)
            .bind(StatusId::from(status))
            .bind(validated_by)
            .fetch_one(executor)
            .await
    }
}
