//! Repository for the `book_stocks` table.
//!
//! The `*_for_update` and `lock_*` lookups take row locks and must run inside a
//! transaction; the circulation workflow is their only caller.

use sqlx::{PgExecutor, PgPool};
use biblio_core::types::DbId;

use crate::models::stock::BookStock;

const COLUMNS: &str = "id, book_id, language, total_quantity, available_quantity, \
                        condition_note, created_at, updated_at";

pub struct StockRepo;

impl StockRepo {
    /// Insert a stock row with every copy on the shelf.
    pub async fn create(
        pool: &PgPool,
        book_id: DbId,
        language: &str,
        total_quantity: i32,
        condition_note: Option<&str>,
    ) -> Result<BookStock, sqlx::Error> {
        let query = format!(
            "INSERT INTO book_stocks (book_id, language, total_quantity, available_quantity, condition_note)
             VALUES ($1, $2, $3, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BookStock>(&query)
            .bind(book_id)
            .bind(language)
            .bind(total_quantity)
            .bind(condition_note)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<BookStock>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM book_stocks WHERE id = $1");
        sqlx::query_as::<_, BookStock>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_book(
        pool: &PgPool,
        book_id: DbId,
    ) -> Result<Vec<BookStock>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM book_stocks WHERE book_id = $1 ORDER BY language");
        sqlx::query_as::<_, BookStock>(&query)
            .bind(book_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<BookStock>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM book_stocks WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, BookStock>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock every stock row of `book_ids` in ascending `id` order, the
    /// same order returns and write-offs lock in.
    pub async fn lock_for_books(
        executor: impl PgExecutor<'_>,
        book_ids: &[DbId],
    ) -> Result<Vec<BookStock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM book_stocks
             WHERE book_id = ANY($1)
             ORDER BY id
             FOR UPDATE"
        );
        sqlx::query_as::<_, BookStock>(&query)
            .bind(book_ids)
            .fetch_all(executor)
            .await
    }

    pub async fn set_available(
        executor: impl PgExecutor<'_>,
        id: DbId,
        available_quantity: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE book_stocks SET available_quantity = $2 WHERE id = $1")
            .bind(id)
            .bind(available_quantity)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Write both counters and the condition note.
    pub async fn set_quantities(
        executor: impl PgExecutor<'_>,
        id: DbId,
        total_quantity: i32,
        available_quantity: i32,
        condition_note: Option<&str>,
    ) -> Result<BookStock, sqlx::Error> {
        let query = format!(
            "UPDATE book_stocks SET
                total_quantity = $2,
                available_quantity = $3,
                condition_note = COALESCE($4, condition_note)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BookStock>(&query)
            .bind(id)
            .bind(total_quantity)
            .bind(available_quantity)
            .bind(condition_note)
            .fetch_one(executor)
            .await
    }

    /// Delete a stock row. Fails with a foreign-key violation once any loan
    /// references it.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM book_stocks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
