//! Repository for the `authors` table.

use sqlx::PgPool;
use biblio_core::types::DbId;

use crate::models::author::{Author, CreateAuthor, UpdateAuthor};

const COLUMNS: &str = "id, full_name, birth_date, death_date, created_at, updated_at";

pub struct AuthorRepo;

impl AuthorRepo {
    pub async fn create(pool: &PgPool, input: &CreateAuthor) -> Result<Author, sqlx::Error> {
        let query = format!(
            "INSERT INTO authors (full_name, birth_date, death_date)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(&input.full_name)
            .bind(input.birth_date)
            .bind(input.death_date)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Author>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM authors WHERE id = $1");
        sqlx::query_as::<_, Author>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List authors alphabetically, optionally filtered by a name fragment.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Author>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM authors
             WHERE ($1::TEXT IS NULL OR full_name ILIKE '%' || $1 || '%')
             ORDER BY full_name, id
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Authors of one book, alphabetically.
    pub async fn list_for_book(pool: &PgPool, book_id: DbId) -> Result<Vec<Author>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM authors
             WHERE id IN (SELECT author_id FROM book_authors WHERE book_id = $1)
             ORDER BY full_name, id"
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(book_id)
            .fetch_all(pool)
            .await
    }

    /// How many of `ids` exist. Used to validate author lists on books.
    pub async fn count_existing(pool: &PgPool, ids: &[DbId]) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAuthor,
    ) -> Result<Option<Author>, sqlx::Error> {
        let query = format!(
            "UPDATE authors SET
                full_name = COALESCE($2, full_name),
                birth_date = COALESCE($3, birth_date),
                death_date = COALESCE($4, death_date)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(id)
            .bind(&input.full_name)
            .bind(input.birth_date)
            .bind(input.death_date)
            .fetch_optional(pool)
            .await
    }

    /// Delete an author. Book links cascade; the books themselves stay.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
