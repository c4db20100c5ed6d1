//! Repository for the `suspensions` table.

use sqlx::{PgExecutor, PgPool};
use biblio_core::types::{Date, DbId};

use crate::models::suspension::Suspension;

const COLUMNS: &str = "id, user_id, start_date, end_date, reason, created_by, created_at";

pub struct SuspensionRepo;

impl SuspensionRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        start_date: Date,
        end_date: Date,
        reason: &str,
        created_by: DbId,
    ) -> Result<Suspension, sqlx::Error> {
        let query = format!(
            "INSERT INTO suspensions (user_id, start_date, end_date, reason, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Suspension>(&query)
            .bind(user_id)
            .bind(start_date)
            .bind(end_date)
            .bind(reason)
            .bind(created_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Suspension>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM suspensions WHERE id = $1");
        sqlx::query_as::<_, Suspension>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The suspension covering `today` that ends last, if any.
    pub async fn find_active_for_user(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        today: Date,
    ) -> Result<Option<Suspension>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM suspensions
             WHERE user_id = $1 AND start_date <= $2 AND end_date >= $2
             ORDER BY end_date DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Suspension>(&query)
            .bind(user_id)
            .bind(today)
            .fetch_optional(executor)
            .await
    }

    /// List suspensions, latest start first. `active_on` keeps only those
    /// covering that date.
    pub async fn list(
        pool: &PgPool,
        user_id: Option<DbId>,
        active_on: Option<Date>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Suspension>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM suspensions
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::DATE IS NULL OR (start_date <= $2 AND end_date >= $2))
             ORDER BY start_date DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Suspension>(&query)
            .bind(user_id)
            .bind(active_on)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM suspensions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
