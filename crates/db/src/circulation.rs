//! Loan workflow: requests, approvals, returns, renewals, losses, penalties
//! and suspensions.
//!
//! Every public function runs in exactly one transaction. Rows that are
//! mutated are locked with `SELECT ... FOR UPDATE` before the domain rules in
//! `biblio_core` are applied, and the notification and audit rows are written
//! on the same transaction. Returning early with an error drops the
//! transaction, so a failed step leaves nothing behind.

use serde_json::json;
use sqlx::PgPool;
use biblio_core::audit::{actions, entities};
use biblio_core::catalog;
use biblio_core::circulation::{self as rules, CirculationPolicy};
use biblio_core::error::CoreError;
use biblio_core::notification;
use biblio_core::status::{LoanRequestStatus, LoanStatus, PaymentStatus, PenaltyReason};
use biblio_core::stock;
use biblio_core::suspension::{self as suspension_rules, MAX_SUSPENSION_REASON_LENGTH};
use biblio_core::types::{Date, DbId};

use crate::models::audit::CreateAuditLog;
use crate::models::loan::{Loan, NewLoan, ReturnItemCondition};
use crate::models::loan_request::{
    CreateLoanRequestItem, LoanRequest, LoanRequestItem, LoanRequestWithItems,
};
use crate::models::notification::NewNotification;
use crate::models::penalty::{CreatePenalty, NewPenalty, Penalty};
use crate::models::stock::{BookStock, UpdateStock};
use crate::models::suspension::{CreateSuspension, Suspension};
use crate::repositories::{
    AuditLogRepo, BookRepo, LoanRepo, LoanRequestRepo, NotificationRepo, PenaltyRepo, StockRepo,
    SuspensionRepo, UserRepo,
};

/// Failure of a workflow step: either a broken rule or a database error.
#[derive(Debug, thiserror::Error)]
pub enum CirculationError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type CirculationResult<T> = Result<T, CirculationError>;

/// The authenticated user performing a step.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: DbId,
    pub is_librarian: bool,
}

/// Result of approving a request.
#[derive(Debug, Clone)]
pub struct Approval {
    pub request: LoanRequestWithItems,
    pub loan: Loan,
}

/// Result of closing a loan (returned or lost), with the penalty it raised.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub loan: Loan,
    pub penalty: Option<Penalty>,
}

// ---------------------------------------------------------------------------
// Loan requests
// ---------------------------------------------------------------------------

/// Submit a loan request on behalf of `requester_id`.
///
/// The requester must be active, not suspended on `today`, and below the
/// active-loan cap. Every requested book must exist.
pub async fn submit_request(
    pool: &PgPool,
    requester_id: DbId,
    items: &[CreateLoanRequestItem],
    policy: &CirculationPolicy,
    today: Date,
) -> CirculationResult<LoanRequestWithItems> {
    let items = normalize_request_items(items)?;
    rules::validate_request_items(
        items
            .iter()
            .map(|i| (i.book_id, i.language.as_deref(), i.quantity)),
    )?;

    let mut tx = pool.begin().await?;

    let requester = UserRepo::find_by_id(&mut *tx, requester_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: entities::USER,
            id: requester_id,
        })?;
    if !requester.is_active {
        return Err(CoreError::Forbidden("Account is deactivated".to_string()).into());
    }

    if let Some(suspension) =
        SuspensionRepo::find_active_for_user(&mut *tx, requester_id, today).await?
    {
        return Err(CoreError::Forbidden(format!(
            "Account is suspended until {}",
            suspension.end_date
        ))
        .into());
    }

    let active = LoanRepo::count_active_for_user(&mut *tx, requester_id).await?;
    if active >= policy.max_active_loans {
        return Err(CoreError::Conflict(format!(
            "Active loan limit reached ({active} of {})",
            policy.max_active_loans
        ))
        .into());
    }

    let book_ids: Vec<DbId> = items.iter().map(|i| i.book_id).collect();
    let missing = BookRepo::find_missing(&mut *tx, &book_ids).await?;
    if let Some(book_id) = missing.first() {
        return Err(CoreError::Validation(format!("Book {book_id} does not exist")).into());
    }

    let request = LoanRequestRepo::create(&mut *tx, requester_id).await?;
    let mut created = Vec::with_capacity(items.len());
    for item in &items {
        created.push(LoanRequestRepo::add_item(&mut *tx, request.id, item).await?);
    }

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(requester_id),
            actions::REQUEST_CREATED,
            entities::LOAN_REQUEST,
            request.id,
        )
        .with_new(json!({ "items": created })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        request_id = request.id,
        requester_id,
        lines = created.len(),
        "Loan request submitted"
    );
    Ok(LoanRequestWithItems::new(request, created))
}

/// Approve a pending request and issue the loan.
///
/// For each line the stock row is the one in the requested language, or when
/// no language was given, the row with the most copies on the shelf that can
/// satisfy the line alone. A line is never split across languages. If any
/// line cannot be served the whole approval fails and no stock moves.
pub async fn approve_request(
    pool: &PgPool,
    request_id: DbId,
    librarian_id: DbId,
    policy: &CirculationPolicy,
    today: Date,
) -> CirculationResult<Approval> {
    let mut tx = pool.begin().await?;

    let request = lock_request(&mut tx, request_id).await?;
    rules::ensure_request_transition(request_status(&request)?, LoanRequestStatus::Approved)?;

    let items = LoanRequestRepo::list_items(&mut *tx, request_id).await?;

    let loan = LoanRepo::create(
        &mut *tx,
        &NewLoan {
            borrower_id: request.requester_id,
            secretary_id: librarian_id,
            loan_date: today,
            due_date: rules::due_date(today, policy.loan_duration_days),
        },
    )
    .await?;

    let book_ids: Vec<DbId> = items.iter().map(|item| item.book_id).collect();
    let mut rows = StockRepo::lock_for_books(&mut *tx, &book_ids).await?;
    let mut touched = vec![false; rows.len()];

    for item in &items {
        let index = pick_stock_row(&rows, item)?;
        let row = &mut rows[index];
        row.available_quantity = stock::checkout(row.available_quantity, item.quantity)?;
        touched[index] = true;
        LoanRepo::add_item(
            &mut *tx,
            loan.id,
            row.id,
            item.quantity,
            row.condition_note.as_deref(),
        )
        .await?;
    }

    for (row, _) in rows.iter().zip(&touched).filter(|(_, touched)| **touched) {
        StockRepo::set_available(&mut *tx, row.id, row.available_quantity).await?;
    }

    let approved =
        LoanRequestRepo::mark_approved(&mut *tx, request_id, librarian_id, loan.id).await?;

    NotificationRepo::create(
        &mut *tx,
        &NewNotification {
            user_id: approved.requester_id,
            loan_id: Some(loan.id),
            message: notification::request_approved(request_id, loan.due_date),
        },
    )
    .await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(librarian_id),
            actions::REQUEST_APPROVED,
            entities::LOAN_REQUEST,
            request_id,
        )
        .with_old(json!({ "status": LoanRequestStatus::Pending.name() }))
        .with_new(json!({ "status": LoanRequestStatus::Approved.name(), "loan_id": loan.id })),
    )
    .await?;
    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(librarian_id),
            actions::LOAN_CREATED,
            entities::LOAN,
            loan.id,
        )
        .with_new(json!({
            "borrower_id": loan.borrower_id,
            "request_id": request_id,
            "due_date": loan.due_date,
        })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        request_id,
        loan_id = loan.id,
        librarian_id,
        due_date = %loan.due_date,
        "Loan request approved"
    );
    Ok(Approval {
        request: LoanRequestWithItems::new(approved, items),
        loan,
    })
}

/// Reject a pending request. A non-blank reason is required.
pub async fn reject_request(
    pool: &PgPool,
    request_id: DbId,
    librarian_id: DbId,
    reason: &str,
) -> CirculationResult<LoanRequestWithItems> {
    let reason = rules::validate_rejection_reason(reason)?;

    let mut tx = pool.begin().await?;

    let request = lock_request(&mut tx, request_id).await?;
    rules::ensure_request_transition(request_status(&request)?, LoanRequestStatus::Rejected)?;

    let rejected =
        LoanRequestRepo::mark_rejected(&mut *tx, request_id, librarian_id, &reason).await?;
    let items = LoanRequestRepo::list_items(&mut *tx, request_id).await?;

    NotificationRepo::create(
        &mut *tx,
        &NewNotification {
            user_id: rejected.requester_id,
            loan_id: None,
            message: notification::request_rejected(request_id, &reason),
        },
    )
    .await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(librarian_id),
            actions::REQUEST_REJECTED,
            entities::LOAN_REQUEST,
            request_id,
        )
        .with_old(json!({ "status": LoanRequestStatus::Pending.name() }))
        .with_new(json!({ "status": LoanRequestStatus::Rejected.name(), "reason": reason })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(request_id, librarian_id, "Loan request rejected");
    Ok(LoanRequestWithItems::new(rejected, items))
}

/// Withdraw a pending request. Only its requester may cancel it.
pub async fn cancel_request(
    pool: &PgPool,
    request_id: DbId,
    requester_id: DbId,
) -> CirculationResult<LoanRequestWithItems> {
    let mut tx = pool.begin().await?;

    let request = lock_request(&mut tx, request_id).await?;
    if request.requester_id != requester_id {
        return Err(
            CoreError::Forbidden("Only the requester can cancel a loan request".to_string())
                .into(),
        );
    }
    rules::ensure_request_transition(request_status(&request)?, LoanRequestStatus::Canceled)?;

    let canceled = LoanRequestRepo::mark_canceled(&mut *tx, request_id).await?;
    let items = LoanRequestRepo::list_items(&mut *tx, request_id).await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(requester_id),
            actions::REQUEST_CANCELED,
            entities::LOAN_REQUEST,
            request_id,
        )
        .with_old(json!({ "status": LoanRequestStatus::Pending.name() }))
        .with_new(json!({ "status": LoanRequestStatus::Canceled.name() })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(request_id, requester_id, "Loan request canceled");
    Ok(LoanRequestWithItems::new(canceled, items))
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

/// Check in an active loan on `today`.
///
/// Every copy goes back on the shelf (capped at the row total). A return
/// after the due date closes the loan as `late_returned` and raises a
/// `late_return` penalty of `days_late * late_fee_cents_per_day`.
pub async fn return_loan(
    pool: &PgPool,
    loan_id: DbId,
    librarian_id: DbId,
    conditions: &[ReturnItemCondition],
    policy: &CirculationPolicy,
    today: Date,
) -> CirculationResult<Settlement> {
    let mut tx = pool.begin().await?;

    let loan = lock_loan(&mut tx, loan_id).await?;
    rules::ensure_loan_active(loan_status(&loan)?)?;

    let items = LoanRepo::list_items(&mut *tx, loan_id).await?;
    if let Some(unknown) = conditions
        .iter()
        .find(|c| !items.iter().any(|i| i.id == c.loan_item_id))
    {
        return Err(CoreError::Validation(format!(
            "Loan item {} does not belong to loan {loan_id}",
            unknown.loan_item_id
        ))
        .into());
    }

    for item in &items {
        let stock_row = lock_stock(&mut tx, item.stock_id).await?;
        let available = stock::restock(
            stock_row.available_quantity,
            stock_row.total_quantity,
            item.quantity,
        );
        StockRepo::set_available(&mut *tx, stock_row.id, available).await?;

        if let Some(condition) = conditions
            .iter()
            .find(|c| c.loan_item_id == item.id)
            .map(|c| c.condition.trim())
            .filter(|c| !c.is_empty())
        {
            LoanRepo::set_item_condition_in(&mut *tx, item.id, condition).await?;
        }
    }

    let status = rules::return_status(loan.due_date, today);
    let returned = LoanRepo::mark_returned(&mut *tx, loan_id, status, today).await?;

    let penalty = if status == LoanStatus::LateReturned {
        let days_late = rules::days_late(loan.due_date, today);
        let amount = rules::late_return_penalty_cents(days_late, policy.late_fee_cents_per_day);
        let note = format!("Returned {days_late} day(s) late");
        let penalty = record_penalty(
            &mut tx,
            librarian_id,
            NewPenalty {
                user_id: loan.borrower_id,
                loan_id: Some(loan_id),
                reason_id: PenaltyReason::LateReturn.id(),
                days_late: Some(i32::try_from(days_late).unwrap_or(i32::MAX)),
                amount_cents: amount,
                note: Some(note),
            },
        )
        .await?;
        Some(penalty)
    } else {
        None
    };

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(librarian_id),
            actions::LOAN_RETURNED,
            entities::LOAN,
            loan_id,
        )
        .with_old(json!({ "status": LoanStatus::Active.name() }))
        .with_new(json!({ "status": status.name(), "return_date": today })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        loan_id,
        librarian_id,
        status = status.name(),
        penalty_cents = penalty.as_ref().map(|p| p.amount_cents),
        "Loan returned"
    );
    Ok(Settlement {
        loan: returned,
        penalty,
    })
}

/// Extend an active loan by another loan period.
///
/// The borrower or any librarian may renew; overdue loans and loans at the
/// renewal cap are refused.
pub async fn renew_loan(
    pool: &PgPool,
    loan_id: DbId,
    actor: Actor,
    policy: &CirculationPolicy,
    today: Date,
) -> CirculationResult<Loan> {
    let mut tx = pool.begin().await?;

    let loan = lock_loan(&mut tx, loan_id).await?;
    if !actor.is_librarian && loan.borrower_id != actor.id {
        return Err(
            CoreError::Forbidden("Only the borrower or a librarian can renew a loan".to_string())
                .into(),
        );
    }
    rules::ensure_renewable(
        loan_status(&loan)?,
        loan.due_date,
        today,
        loan.renewal_count,
        policy.max_renewals,
    )?;

    let new_due = rules::due_date(loan.due_date, policy.loan_duration_days);
    let renewed = LoanRepo::extend(&mut *tx, loan_id, new_due).await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(Some(actor.id), actions::LOAN_RENEWED, entities::LOAN, loan_id)
            .with_old(json!({ "due_date": loan.due_date, "renewal_count": loan.renewal_count }))
            .with_new(json!({
                "due_date": renewed.due_date,
                "renewal_count": renewed.renewal_count,
            })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(loan_id, actor_id = actor.id, due_date = %new_due, "Loan renewed");
    Ok(renewed)
}

/// Declare an active loan lost.
///
/// The lost copies are written off their stock rows and the borrower is
/// charged `lost_item_fee_cents` per copy.
pub async fn declare_lost(
    pool: &PgPool,
    loan_id: DbId,
    librarian_id: DbId,
    policy: &CirculationPolicy,
) -> CirculationResult<Settlement> {
    let mut tx = pool.begin().await?;

    let loan = lock_loan(&mut tx, loan_id).await?;
    rules::ensure_loan_active(loan_status(&loan)?)?;

    let items = LoanRepo::list_items(&mut *tx, loan_id).await?;
    let mut copies: i64 = 0;
    for item in &items {
        let stock_row = lock_stock(&mut tx, item.stock_id).await?;
        let (total, available) = stock::write_off(
            stock_row.total_quantity,
            stock_row.available_quantity,
            item.quantity,
        );
        StockRepo::set_quantities(&mut *tx, stock_row.id, total, available, None).await?;
        copies += i64::from(item.quantity);
    }

    let lost = LoanRepo::mark_lost(&mut *tx, loan_id).await?;

    let penalty = record_penalty(
        &mut tx,
        librarian_id,
        NewPenalty {
            user_id: loan.borrower_id,
            loan_id: Some(loan_id),
            reason_id: PenaltyReason::LostItem.id(),
            days_late: None,
            amount_cents: copies * policy.lost_item_fee_cents,
            note: Some(format!("{copies} lost copy(ies)")),
        },
    )
    .await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(Some(librarian_id), actions::LOAN_LOST, entities::LOAN, loan_id)
            .with_old(json!({ "status": LoanStatus::Active.name() }))
            .with_new(json!({ "status": LoanStatus::Lost.name(), "copies": copies })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(loan_id, librarian_id, copies, "Loan declared lost");
    Ok(Settlement {
        loan: lost,
        penalty: Some(penalty),
    })
}

// ---------------------------------------------------------------------------
// Stock
// ---------------------------------------------------------------------------

/// Resize a stock row or change its condition note.
///
/// Resizing keeps the number of copies out on loan constant, so the total can
/// never drop below it.
pub async fn update_stock(
    pool: &PgPool,
    stock_id: DbId,
    input: &UpdateStock,
    actor_id: DbId,
) -> CirculationResult<BookStock> {
    let mut tx = pool.begin().await?;

    let current = StockRepo::find_for_update(&mut *tx, stock_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: entities::BOOK_STOCK,
            id: stock_id,
        })?;

    let (total, available) = match input.total_quantity {
        Some(new_total) => (
            new_total,
            stock::resize(current.total_quantity, current.available_quantity, new_total)?,
        ),
        None => (current.total_quantity, current.available_quantity),
    };
    stock::validate_quantities(total, available)?;

    let updated = StockRepo::set_quantities(
        &mut *tx,
        stock_id,
        total,
        available,
        input.condition_note.as_deref(),
    )
    .await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(actor_id),
            actions::ENTITY_UPDATE,
            entities::BOOK_STOCK,
            stock_id,
        )
        .with_old(json!({
            "total_quantity": current.total_quantity,
            "available_quantity": current.available_quantity,
        }))
        .with_new(json!({
            "total_quantity": updated.total_quantity,
            "available_quantity": updated.available_quantity,
        })),
    )
    .await?;

    tx.commit().await?;
    Ok(updated)
}

/// Remove a stock row with no copies out on loan.
///
/// Rows still referenced by past loan items are kept by the foreign key, so
/// the delete fails with a database error the caller maps to a conflict.
pub async fn delete_stock(pool: &PgPool, stock_id: DbId, actor_id: DbId) -> CirculationResult<()> {
    let mut tx = pool.begin().await?;

    let current = lock_stock(&mut tx, stock_id).await?;
    if current.available_quantity < current.total_quantity {
        return Err(CoreError::Conflict("Stock row has copies out on loan".into()).into());
    }

    StockRepo::delete(&mut *tx, stock_id).await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(actor_id),
            actions::ENTITY_DELETE,
            entities::BOOK_STOCK,
            stock_id,
        )
        .with_old(json!(current)),
    )
    .await?;

    tx.commit().await?;
    tracing::info!(stock_id, actor_id, "Stock row deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Penalties
// ---------------------------------------------------------------------------

/// Record a penalty entered by a librarian.
///
/// When a loan is given it must belong to the penalized user.
pub async fn create_penalty(
    pool: &PgPool,
    input: &CreatePenalty,
    librarian_id: DbId,
) -> CirculationResult<Penalty> {
    if input.amount_cents <= 0 {
        return Err(CoreError::Validation("Penalty amount must be positive".to_string()).into());
    }
    let reason = match input.reason.as_deref() {
        None => PenaltyReason::DamagedItem,
        Some(name) => PenaltyReason::from_name(name).ok_or_else(|| {
            CoreError::Validation(format!("Unknown penalty reason '{name}'"))
        })?,
    };

    let mut tx = pool.begin().await?;

    if UserRepo::find_by_id(&mut *tx, input.user_id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: entities::USER,
            id: input.user_id,
        }
        .into());
    }
    if let Some(loan_id) = input.loan_id {
        let loan = LoanRepo::find_by_id(&mut *tx, loan_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: entities::LOAN,
                id: loan_id,
            })?;
        if loan.borrower_id != input.user_id {
            return Err(CoreError::Validation(format!(
                "Loan {loan_id} does not belong to user {}",
                input.user_id
            ))
            .into());
        }
    }

    let note = input
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let penalty = record_penalty(
        &mut tx,
        librarian_id,
        NewPenalty {
            user_id: input.user_id,
            loan_id: input.loan_id,
            reason_id: reason.id(),
            days_late: None,
            amount_cents: input.amount_cents,
            note,
        },
    )
    .await?;

    tx.commit().await?;
    Ok(penalty)
}

/// Settle an unpaid penalty as `paid` or `waived`.
pub async fn settle_penalty(
    pool: &PgPool,
    penalty_id: DbId,
    librarian_id: DbId,
    outcome: PaymentStatus,
) -> CirculationResult<Penalty> {
    let action = match outcome {
        PaymentStatus::Paid => actions::PENALTY_PAID,
        PaymentStatus::Waived => actions::PENALTY_WAIVED,
        PaymentStatus::Unpaid => {
            return Err(
                CoreError::Validation("A penalty can only be paid or waived".to_string()).into(),
            )
        }
    };

    let mut tx = pool.begin().await?;

    let penalty = PenaltyRepo::find_for_update(&mut *tx, penalty_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: entities::PENALTY,
            id: penalty_id,
        })?;
    if penalty.payment_status_id != PaymentStatus::Unpaid.id() {
        let current = PaymentStatus::from_id(penalty.payment_status_id)
            .map(|s| s.name())
            .unwrap_or("unknown");
        return Err(
            CoreError::Conflict(format!("Penalty is already settled (status: {current})")).into(),
        );
    }

    let settled = PenaltyRepo::settle(&mut *tx, penalty_id, outcome, librarian_id).await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(Some(librarian_id), action, entities::PENALTY, penalty_id)
            .with_old(json!({ "payment_status": PaymentStatus::Unpaid.name() }))
            .with_new(json!({
                "payment_status": outcome.name(),
                "amount_cents": settled.amount_cents,
            })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(penalty_id, librarian_id, outcome = outcome.name(), "Penalty settled");
    Ok(settled)
}

// ---------------------------------------------------------------------------
// Suspensions
// ---------------------------------------------------------------------------

/// Suspend a user from submitting loan requests between two dates.
pub async fn create_suspension(
    pool: &PgPool,
    input: &CreateSuspension,
    librarian_id: DbId,
    today: Date,
) -> CirculationResult<Suspension> {
    let start = input.start_date.unwrap_or(today);
    suspension_rules::validate_range(start, input.end_date)?;
    let reason = catalog::validate_name("Reason", &input.reason, MAX_SUSPENSION_REASON_LENGTH)?;

    let mut tx = pool.begin().await?;

    if UserRepo::find_by_id(&mut *tx, input.user_id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: entities::USER,
            id: input.user_id,
        }
        .into());
    }

    let suspension = SuspensionRepo::create(
        &mut *tx,
        input.user_id,
        start,
        input.end_date,
        &reason,
        librarian_id,
    )
    .await?;

    NotificationRepo::create(
        &mut *tx,
        &NewNotification {
            user_id: input.user_id,
            loan_id: None,
            message: notification::suspended(start, input.end_date, &reason),
        },
    )
    .await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(librarian_id),
            actions::SUSPENSION_CREATED,
            entities::SUSPENSION,
            suspension.id,
        )
        .with_new(json!({
            "user_id": suspension.user_id,
            "start_date": suspension.start_date,
            "end_date": suspension.end_date,
        })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        suspension_id = suspension.id,
        user_id = suspension.user_id,
        end_date = %suspension.end_date,
        "User suspended"
    );
    Ok(suspension)
}

/// Lift a suspension by deleting it.
pub async fn delete_suspension(
    pool: &PgPool,
    suspension_id: DbId,
    librarian_id: DbId,
) -> CirculationResult<()> {
    let mut tx = pool.begin().await?;

    let suspension = SuspensionRepo::find_by_id(&mut *tx, suspension_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: entities::SUSPENSION,
            id: suspension_id,
        })?;
    SuspensionRepo::delete(&mut *tx, suspension_id).await?;

    AuditLogRepo::create(
        &mut *tx,
        &CreateAuditLog::new(
            Some(librarian_id),
            actions::SUSPENSION_DELETED,
            entities::SUSPENSION,
            suspension_id,
        )
        .with_old(json!({
            "user_id": suspension.user_id,
            "start_date": suspension.start_date,
            "end_date": suspension.end_date,
        })),
    )
    .await?;

    tx.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

/// Create a `due_reminder` notification for every active loan due within
/// `policy.due_reminder_days` of `today` that has never been reminded.
/// Only the `today` argument is compared, never the clock.
///
/// Returns the number of reminders created.
pub async fn send_due_reminders(
    pool: &PgPool,
    policy: &CirculationPolicy,
    today: Date,
) -> CirculationResult<u64> {
    let days = policy.due_reminder_days.max(0);
    let until = rules::due_date(today, days);

    let mut tx = pool.begin().await?;

    let loans = LoanRepo::list_due_for_reminder(&mut *tx, today, until).await?;

    for loan in &loans {
        NotificationRepo::create(
            &mut *tx,
            &NewNotification {
                user_id: loan.borrower_id,
                loan_id: Some(loan.id),
                message: notification::due_reminder(loan.id, loan.due_date),
            },
        )
        .await?;
    }

    tx.commit().await?;
    Ok(loans.len() as u64)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

async fn lock_request(tx: &mut Tx<'_>, id: DbId) -> CirculationResult<LoanRequest> {
    LoanRequestRepo::find_for_update(&mut **tx, id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: entities::LOAN_REQUEST,
                id,
            }
            .into()
        })
}

async fn lock_loan(tx: &mut Tx<'_>, id: DbId) -> CirculationResult<Loan> {
    LoanRepo::find_for_update(&mut **tx, id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: entities::LOAN,
                id,
            }
            .into()
        })
}

async fn lock_stock(tx: &mut Tx<'_>, id: DbId) -> CirculationResult<BookStock> {
    StockRepo::find_for_update(&mut **tx, id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: entities::BOOK_STOCK,
                id,
            }
            .into()
        })
}

/// Index of the locked row serving `item`: the requested language, or else
/// the row with the most copies on the shelf that covers the whole line.
fn pick_stock_row(rows: &[BookStock], item: &LoanRequestItem) -> Result<usize, CoreError> {
    let mut candidates = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.book_id == item.book_id);

    match &item.language {
        Some(language) => candidates
            .find(|(_, row)| row.language == *language)
            .map(|(index, _)| index)
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "Book {} has no stock in language '{language}'",
                    item.book_id
                ))
            }),
        None => candidates
            .filter(|(_, row)| row.available_quantity >= item.quantity)
            .max_by(|(_, a), (_, b)| {
                a.available_quantity
                    .cmp(&b.available_quantity)
                    .then(b.id.cmp(&a.id))
            })
            .map(|(index, _)| index)
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "Insufficient stock for book {}: {} copies requested",
                    item.book_id, item.quantity
                ))
            }),
    }
}

fn request_status(request: &LoanRequest) -> Result<LoanRequestStatus, CoreError> {
    request.status().ok_or_else(|| {
        CoreError::Internal(format!("Unknown loan request status id {}", request.status_id))
    })
}

fn loan_status(loan: &Loan) -> Result<LoanStatus, CoreError> {
    loan.status()
        .ok_or_else(|| CoreError::Internal(format!("Unknown loan status id {}", loan.status_id)))
}

/// Insert a penalty with its notification and audit row.
async fn record_penalty(
    tx: &mut Tx<'_>,
    librarian_id: DbId,
    input: NewPenalty,
) -> CirculationResult<Penalty> {
    let penalty = PenaltyRepo::create(&mut **tx, &input).await?;

    NotificationRepo::create(
        &mut **tx,
        &NewNotification {
            user_id: penalty.user_id,
            loan_id: penalty.loan_id,
            message: notification::penalty_assessed(
                penalty.loan_id,
                penalty.amount_cents,
                penalty.note.as_deref().unwrap_or(""),
            ),
        },
    )
    .await?;

    AuditLogRepo::create(
        &mut **tx,
        &CreateAuditLog::new(
            Some(librarian_id),
            actions::PENALTY_CREATED,
            entities::PENALTY,
            penalty.id,
        )
        .with_new(json!({
            "user_id": penalty.user_id,
            "loan_id": penalty.loan_id,
            "amount_cents": penalty.amount_cents,
        })),
    )
    .await?;

    Ok(penalty)
}

/// Trim and lowercase languages; a blank language means "any".
fn normalize_request_items(
    items: &[CreateLoanRequestItem],
) -> Result<Vec<CreateLoanRequestItem>, CoreError> {
    items
        .iter()
        .map(|item| {
            let language = match item.language.as_deref().map(str::trim) {
                Some(code) if !code.is_empty() => {
                    let code = code.to_ascii_lowercase();
                    catalog::validate_language(&code)?;
                    Some(code)
                }
                _ => None,
            };
            Ok(CreateLoanRequestItem {
                book_id: item.book_id,
                language,
                quantity: item.quantity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn item(book_id: DbId, language: Option<&str>) -> CreateLoanRequestItem {
        CreateLoanRequestItem {
            book_id,
            language: language.map(str::to_string),
            quantity: 1,
        }
    }

    #[test]
    fn normalize_lowercases_and_drops_blank_languages() {
        let items = normalize_request_items(&[item(1, Some(" EN ")), item(2, Some("  "))]).unwrap();
        assert_eq!(items[0].language.as_deref(), Some("en"));
        assert_eq!(items[1].language, None);
    }

    #[test]
    fn normalize_rejects_bad_language_codes() {
        assert_matches!(
            normalize_request_items(&[item(1, Some("english"))]),
            Err(CoreError::Validation(_))
        );
    }

    fn stock_row(id: DbId, book_id: DbId, language: &str, available: i32) -> BookStock {
        BookStock {
            id,
            book_id,
            language: language.to_string(),
            total_quantity: available,
            available_quantity: available,
            condition_note: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn request_line(book_id: DbId, language: Option<&str>, quantity: i32) -> LoanRequestItem {
        LoanRequestItem {
            id: 1,
            loan_request_id: 1,
            book_id,
            language: language.map(str::to_string),
            quantity,
        }
    }

    #[test]
    fn pick_honours_requested_language() {
        let rows = [stock_row(3, 1, "en", 5), stock_row(7, 1, "fr", 1)];
        assert_eq!(pick_stock_row(&rows, &request_line(1, Some("fr"), 1)).unwrap(), 1);
        assert_matches!(
            pick_stock_row(&rows, &request_line(1, Some("de"), 1)),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn pick_prefers_fullest_row_then_lowest_id() {
        let rows = [
            stock_row(2, 1, "en", 2),
            stock_row(4, 1, "fr", 4),
            stock_row(5, 1, "it", 4),
            stock_row(6, 2, "en", 9),
        ];
        assert_eq!(pick_stock_row(&rows, &request_line(1, None, 2)).unwrap(), 1);
        assert_matches!(
            pick_stock_row(&rows, &request_line(1, None, 5)),
            Err(CoreError::Conflict(_))
        );
    }
}
