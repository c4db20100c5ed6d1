//! Repository for the `loans` and `loan_items` tables.

use sqlx::{PgExecutor, PgPool};
use biblio_core::status::{LoanStatus, StatusId};
use biblio_core::types::{Date, DbId};

use crate::models::loan::{Loan, LoanFilter, LoanItem, NewLoan};

const COLUMNS: &str = "id, borrower_id, secretary_id, status_id, loan_date, due_date, \
                        return_date, renewal_count, created_at, updated_at";

/// Loan items joined to their stock row and book.
const ITEM_SELECT: &str = "SELECT li.id, li.loan_id, li.stock_id, s.book_id, b.title, s.language, \
                                  li.quantity, li.condition_out, li.condition_in
                           FROM loan_items li
                           JOIN book_stocks s ON s.id = li.stock_id
                           JOIN books b ON b.id = s.book_id";

pub struct LoanRepo;

impl LoanRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewLoan,
    ) -> Result<Loan, sqlx::Error> {
        let query = format!(
            "INSERT INTO loans (borrower_id, secretary_id, status_id, loan_date, due_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Loan>(&query)
            .bind(input.borrower_id)
            .bind(input.secretary_id)
            .bind(LoanStatus::Active.id())
            .bind(input.loan_date)
            .bind(input.due_date)
            .fetch_one(executor)
            .await
    }

    /// Attach `quantity` copies from `stock_id`. Returns the new item ID.
    pub async fn add_item(
        executor: impl PgExecutor<'_>,
        loan_id: DbId,
        stock_id: DbId,
        quantity: i32,
        condition_out: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO loan_items (loan_id, stock_id, quantity, condition_out)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(loan_id)
        .bind(stock_id)
        .bind(quantity)
        .bind(condition_out)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Loan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loans WHERE id = $1");
        sqlx::query_as::<_, Loan>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Loan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loans WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Loan>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Items of one loan, ordered by stock row so locks are taken in a
    /// stable order.
    pub async fn list_items(
        executor: impl PgExecutor<'_>,
        loan_id: DbId,
    ) -> Result<Vec<LoanItem>, sqlx::Error> {
        let query = format!("{ITEM_SELECT} WHERE li.loan_id = $1 ORDER BY li.stock_id, li.id");
        sqlx::query_as::<_, LoanItem>(&query)
            .bind(loan_id)
            .fetch_all(executor)
            .await
    }

    /// List loans, newest first.
    pub async fn list(pool: &PgPool, filter: &LoanFilter) -> Result<Vec<Loan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM loans
             WHERE ($1::BIGINT IS NULL OR borrower_id = $1)
               AND ($2::SMALLINT IS NULL OR status_id = $2)
               AND (NOT $3::BOOL OR (status_id = $4 AND due_date < $5))
             ORDER BY loan_date DESC, id DESC
             LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, Loan>(&query)
            .bind(filter.borrower_id)
            .bind(filter.status_id)
            .bind(filter.overdue_only)
            .bind(LoanStatus::Active.id())
            .bind(filter.today)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_active_for_user(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE borrower_id = $1 AND status_id = $2")
            .bind(user_id)
            .bind(LoanStatus::Active.id())
            .fetch_one(executor)
            .await
    }

    /// Close a loan as `returned` or `late_returned`.
    pub async fn mark_returned(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: LoanStatus,
        return_date: Date,
    ) -> Result<Loan, sqlx::Error> {
        let query = format!(
            "UPDATE loans SET status_id = $2, return_date = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Loan>(&query)
            .bind(id)
            .bind(StatusId::from(status))
            .bind(return_date)
            .fetch_one(executor)
            .await
    }

    pub async fn mark_lost(executor: impl PgExecutor<'_>, id: DbId) -> Result<Loan, sqlx::Error> {
        let query = format!(
            "UPDATE loans SET status_id = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Loan>(&query)
            .bind(id)
            .bind(LoanStatus::Lost.id())
            .fetch_one(executor)
            .await
    }

    /// Move the due date and count one renewal.
    pub async fn extend(
        executor: impl PgExecutor<'_>,
        id: DbId,
        new_due_date: Date,
    ) -> Result<Loan, sqlx::Error> {
        let query = format!(
            "UPDATE loans SET due_date = $2, renewal_count = renewal_count + 1
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Loan>(&query)
            .bind(id)
            .bind(new_due_date)
            .fetch_one(executor)
            .await
    }

    pub async fn set_item_condition_in(
        executor: impl PgExecutor<'_>,
        item_id: DbId,
        condition: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE loan_items SET condition_in = $2 WHERE id = $1")
            .bind(item_id)
            .bind(condition)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Active loans due between `today` and `until` (inclusive) that have
    /// never been sent a due reminder. A loan is reminded at most once, even
    /// after a renewal moves its due date.
    pub async fn list_due_for_reminder(
        executor: impl PgExecutor<'_>,
        today: Date,
        until: Date,
    ) -> Result<Vec<Loan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM loans l
             WHERE l.status_id = $1
               AND l.due_date BETWEEN $2 AND $3
               AND NOT EXISTS (
                   SELECT 1 FROM notifications n
                   WHERE n.loan_id = l.id
                     AND n.kind = 'due_reminder'
               )
             ORDER BY l.due_date, l.id
             FOR UPDATE OF l SKIP LOCKED"
        );
        sqlx::query_as::<_, Loan>(&query)
            .bind(LoanStatus::Active.id())
            .bind(today)
            .bind(until)
            .fetch_all(executor)
            .await
    }
}
