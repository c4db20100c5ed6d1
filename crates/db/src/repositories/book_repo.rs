//! Repository for the `books` and `book_authors` tables.

use sqlx::{PgExecutor, PgPool};
use biblio_core::types::DbId;

use crate::models::book::{Book, BookFilter, BookSummary, CreateBook, UpdateBook};

const COLUMNS: &str = "id, isbn, title, cover_url, summary, publisher, publication_year, \
                        category_id, created_at, updated_at";

pub struct BookRepo;

impl BookRepo {
    /// Insert a book and link its authors in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateBook) -> Result<Book, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO books (isbn, title, cover_url, summary, publisher, publication_year, category_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(&input.isbn)
            .bind(&input.title)
            .bind(&input.cover_url)
            .bind(&input.summary)
            .bind(&input.publisher)
            .bind(input.publication_year)
            .bind(input.category_id)
            .fetch_one(&mut *tx)
            .await?;

        Self::link_authors(&mut *tx, book.id, &input.author_ids).await?;

        tx.commit().await?;
        Ok(book)
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Book>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1");
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// IDs from `ids` that have no matching book.
    pub async fn find_missing(
        executor: impl PgExecutor<'_>,
        ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT requested.id FROM UNNEST($1::BIGINT[]) AS requested(id)
             WHERE NOT EXISTS (SELECT 1 FROM books b WHERE b.id = requested.id)
             ORDER BY requested.id",
        )
        .bind(ids)
        .fetch_all(executor)
        .await
    }

    /// Catalog search with availability totals.
    pub async fn search(
        pool: &PgPool,
        filter: &BookFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BookSummary>, sqlx::Error> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        sqlx::query_as::<_, BookSummary>(
            "SELECT b.id, b.isbn, b.title, b.cover_url, b.publisher, b.publication_year,
                    b.category_id,
                    COALESCE(SUM(s.total_quantity), 0)::BIGINT AS total_copies,
                    COALESCE(SUM(s.available_quantity), 0)::BIGINT AS available_copies,
                    b.created_at
             FROM books b
             LEFT JOIN book_stocks s ON s.book_id = b.id
             WHERE ($1::TEXT IS NULL
                    OR b.title ILIKE '%' || $1 || '%'
                    OR b.isbn ILIKE '%' || $1 || '%'
                    OR EXISTS (SELECT 1 FROM book_authors ba
                               JOIN authors a ON a.id = ba.author_id
                               WHERE ba.book_id = b.id AND a.full_name ILIKE '%' || $1 || '%'))
               AND ($2::BIGINT IS NULL OR b.category_id = $2)
               AND ($3::BIGINT IS NULL OR EXISTS (SELECT 1 FROM book_authors ba
                                                  WHERE ba.book_id = b.id AND ba.author_id = $3))
               AND ($4::TEXT IS NULL OR EXISTS (SELECT 1 FROM book_stocks ls
                                                WHERE ls.book_id = b.id AND ls.language = $4))
             GROUP BY b.id
             HAVING (NOT $5::BOOL OR COALESCE(SUM(s.available_quantity), 0) > 0)
             ORDER BY b.title, b.id
             LIMIT $6 OFFSET $7",
        )
        .bind(search)
        .bind(filter.category_id)
        .bind(filter.author_id)
        .bind(&filter.language)
        .bind(filter.available_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Update a book. A present `author_ids` replaces the author list.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBook,
    ) -> Result<Option<Book>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE books SET
                isbn = COALESCE($2, isbn),
                title = COALESCE($3, title),
                cover_url = COALESCE($4, cover_url),
                summary = COALESCE($5, summary),
                publisher = COALESCE($6, publisher),
                publication_year = COALESCE($7, publication_year),
                category_id = COALESCE($8, category_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(&input.isbn)
            .bind(&input.title)
            .bind(&input.cover_url)
            .bind(&input.summary)
            .bind(&input.publisher)
            .bind(input.publication_year)
            .bind(input.category_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(book) = book else {
            return Ok(None);
        };

        if let Some(author_ids) = &input.author_ids {
            sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::link_authors(&mut *tx, id, author_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(book))
    }

    /// Delete a book and its stock rows.
    ///
    /// Fails with a foreign-key violation when any stock row is referenced by
    /// a loan, so circulation history is never orphaned.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_authors(
        executor: impl PgExecutor<'_>,
        book_id: DbId,
        author_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        if author_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO book_authors (book_id, author_id)
             SELECT $1, UNNEST($2::BIGINT[])
             ON CONFLICT DO NOTHING",
        )
        .bind(book_id)
        .bind(author_ids)
        .execute(executor)
        .await?;
        Ok(())
    }
}
