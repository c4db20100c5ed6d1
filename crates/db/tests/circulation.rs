//! Integration tests for the loan workflow.
//!
//! Each test runs against a fresh database and drives the `circulation`
//! functions end to end: stock counters, statuses, penalties, notifications
//! and audit rows.

use assert_matches::assert_matches;
use biblio_core::circulation::CirculationPolicy;
use biblio_core::error::CoreError;
use biblio_core::status::{LoanRequestStatus, LoanStatus, PaymentStatus, PenaltyReason};
use biblio_core::types::{Date, DbId};
use biblio_db::circulation::{self, Actor, CirculationError};
use biblio_db::models::book::CreateBook;
use biblio_db::models::loan::ReturnItemCondition;
use biblio_db::models::loan_request::CreateLoanRequestItem;
use biblio_db::models::penalty::CreatePenalty;
use biblio_db::models::stock::UpdateStock;
use biblio_db::models::suspension::CreateSuspension;
use biblio_db::models::user::CreateUser;
use biblio_db::repositories::{
    BookRepo, LoanRepo, LoanRequestRepo, NotificationRepo, PenaltyRepo, StockRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day(m: u32, d: u32) -> Date {
    Date::from_ymd_opt(2026, m, d).unwrap()
}

async fn new_user(pool: &PgPool, username: &str, role: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.org"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "not-a-real-hash".to_string(),
            role: role.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_book(pool: &PgPool, title: &str) -> DbId {
    BookRepo::create(
        pool,
        &CreateBook {
            isbn: None,
            title: title.to_string(),
            cover_url: None,
            summary: None,
            publisher: None,
            publication_year: None,
            category_id: None,
            author_ids: vec![],
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_stock(pool: &PgPool, book_id: DbId, language: &str, total: i32) -> DbId {
    StockRepo::create(pool, book_id, language, total, None)
        .await
        .unwrap()
        .id
}

fn line(book_id: DbId, language: Option<&str>, quantity: i32) -> CreateLoanRequestItem {
    CreateLoanRequestItem {
        book_id,
        language: language.map(str::to_string),
        quantity,
    }
}

async fn available(pool: &PgPool, stock_id: DbId) -> i32 {
    StockRepo::find_by_id(pool, stock_id)
        .await
        .unwrap()
        .unwrap()
        .available_quantity
}

/// A reader, a librarian, and one book with 3 French copies.
struct Fixture {
    reader: DbId,
    librarian: DbId,
    book: DbId,
    stock: DbId,
}

async fn fixture(pool: &PgPool) -> Fixture {
    let reader = new_user(pool, "reader", "reader").await;
    let librarian = new_user(pool, "desk", "secretary").await;
    let book = new_book(pool, "Les Misérables").await;
    let stock = new_stock(pool, book, "fr", 3).await;
    Fixture {
        reader,
        librarian,
        book,
        stock,
    }
}

/// Submit and approve a request for `qty` copies issued on `issued`.
async fn issue_loan(pool: &PgPool, fx: &Fixture, qty: i32, issued: Date) -> DbId {
    let policy = CirculationPolicy::default();
    let request = circulation::submit_request(
        pool,
        fx.reader,
        &[line(fx.book, Some("fr"), qty)],
        &policy,
        issued,
    )
    .await
    .unwrap();
    circulation::approve_request(pool, request.request.id, fx.librarian, &policy, issued)
        .await
        .unwrap()
        .loan
        .id
}

// ---------------------------------------------------------------------------
// Requests and approval
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn approve_decrements_stock_and_creates_loan(pool: PgPool) {
    let fx = fixture(&pool).await;
    let policy = CirculationPolicy::default();

    let request = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, Some("FR"), 2)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();
    assert_eq!(request.status, "pending");
    assert_eq!(request.items[0].language.as_deref(), Some("fr"));

    let approval =
        circulation::approve_request(&pool, request.request.id, fx.librarian, &policy, day(3, 1))
            .await
            .unwrap();

    assert_eq!(approval.request.status, "approved");
    assert_eq!(approval.request.request.loan_id, Some(approval.loan.id));
    assert_eq!(approval.request.request.secretary_id, Some(fx.librarian));
    assert_eq!(approval.loan.status_id, LoanStatus::Active.id());
    assert_eq!(approval.loan.due_date, day(3, 15));
    assert_eq!(available(&pool, fx.stock).await, 1);

    let items = LoanRepo::list_items(&pool, approval.loan.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].stock_id, fx.stock);
    assert_eq!(items[0].quantity, 2);

    let notes = NotificationRepo::list_for_user(&pool, fx.reader, false, 10, 0)
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, "approval");
}

#[sqlx::test(migrations = "./migrations")]
async fn approval_without_language_picks_row_that_can_serve_the_line(pool: PgPool) {
    let fx = fixture(&pool).await;
    let english = new_stock(&pool, fx.book, "en", 5).await;
    let policy = CirculationPolicy::default();

    let request = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, None, 4)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();
    circulation::approve_request(&pool, request.request.id, fx.librarian, &policy, day(3, 1))
        .await
        .unwrap();

    assert_eq!(available(&pool, english).await, 1);
    assert_eq!(available(&pool, fx.stock).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn approval_counts_copies_taken_by_earlier_lines(pool: PgPool) {
    let fx = fixture(&pool).await;
    let policy = CirculationPolicy::default();

    // 3 French copies: the first line leaves 1, too few for the second.
    let request = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, Some("fr"), 2), line(fx.book, None, 2)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();

    let result =
        circulation::approve_request(&pool, request.request.id, fx.librarian, &policy, day(3, 1))
            .await;
    assert_matches!(result, Err(CirculationError::Core(CoreError::Conflict(_))));
    assert_eq!(available(&pool, fx.stock).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_approvals_with_opposite_line_order_both_succeed(pool: PgPool) {
    let fx = fixture(&pool).await;
    let other_book = new_book(&pool, "Germinal").await;
    let other_stock = new_stock(&pool, other_book, "fr", 3).await;
    let policy = CirculationPolicy::default();

    let forward = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, Some("fr"), 1), line(other_book, Some("fr"), 1)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();
    let backward = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(other_book, Some("fr"), 1), line(fx.book, Some("fr"), 1)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();

    let (first, second) = tokio::join!(
        circulation::approve_request(&pool, forward.request.id, fx.librarian, &policy, day(3, 1)),
        circulation::approve_request(&pool, backward.request.id, fx.librarian, &policy, day(3, 1)),
    );
    assert!(first.is_ok());
    assert!(second.is_ok());

    assert_eq!(available(&pool, fx.stock).await, 1);
    assert_eq!(available(&pool, other_stock).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn approval_is_atomic_when_one_line_cannot_be_served(pool: PgPool) {
    let fx = fixture(&pool).await;
    let other_book = new_book(&pool, "Germinal").await;
    let other_stock = new_stock(&pool, other_book, "fr", 1).await;
    let policy = CirculationPolicy::default();

    let request = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, Some("fr"), 2), line(other_book, Some("fr"), 2)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();

    let result =
        circulation::approve_request(&pool, request.request.id, fx.librarian, &policy, day(3, 1))
            .await;
    assert_matches!(result, Err(CirculationError::Core(CoreError::Conflict(_))));

    assert_eq!(available(&pool, fx.stock).await, 3);
    assert_eq!(available(&pool, other_stock).await, 1);
    let still = LoanRequestRepo::find_by_id(&pool, request.request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(still.status(), Some(LoanRequestStatus::Pending));
    assert_eq!(still.loan_id, None);
    assert_eq!(
        LoanRepo::count_active_for_user(&pool, fx.reader).await.unwrap(),
        0
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn decided_request_cannot_be_decided_again(pool: PgPool) {
    let fx = fixture(&pool).await;
    let policy = CirculationPolicy::default();
    let request = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, None, 1)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();
    let id = request.request.id;

    circulation::reject_request(&pool, id, fx.librarian, "Reserved for a class")
        .await
        .unwrap();

    assert_matches!(
        circulation::approve_request(&pool, id, fx.librarian, &policy, day(3, 1)).await,
        Err(CirculationError::Core(CoreError::Conflict(_)))
    );
    assert_matches!(
        circulation::cancel_request(&pool, id, fx.reader).await,
        Err(CirculationError::Core(CoreError::Conflict(_)))
    );
    assert_eq!(available(&pool, fx.stock).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn rejection_requires_reason_and_notifies(pool: PgPool) {
    let fx = fixture(&pool).await;
    let policy = CirculationPolicy::default();
    let request = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, None, 1)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();

    assert_matches!(
        circulation::reject_request(&pool, request.request.id, fx.librarian, "  ").await,
        Err(CirculationError::Core(CoreError::Validation(_)))
    );

    let rejected =
        circulation::reject_request(&pool, request.request.id, fx.librarian, "Damaged copies")
            .await
            .unwrap();
    assert_eq!(rejected.status, "rejected");
    assert_eq!(
        rejected.request.rejection_reason.as_deref(),
        Some("Damaged copies")
    );

    let notes = NotificationRepo::list_for_user(&pool, fx.reader, true, 10, 0)
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, "rejection");
    assert!(notes[0].message.contains("Damaged copies"));
}

#[sqlx::test(migrations = "./migrations")]
async fn only_requester_can_cancel(pool: PgPool) {
    let fx = fixture(&pool).await;
    let stranger = new_user(&pool, "stranger", "reader").await;
    let policy = CirculationPolicy::default();
    let request = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, None, 1)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();

    assert_matches!(
        circulation::cancel_request(&pool, request.request.id, stranger).await,
        Err(CirculationError::Core(CoreError::Forbidden(_)))
    );
    let canceled = circulation::cancel_request(&pool, request.request.id, fx.reader)
        .await
        .unwrap();
    assert_eq!(canceled.status, "canceled");
}

#[sqlx::test(migrations = "./migrations")]
async fn submit_rejects_unknown_books(pool: PgPool) {
    let fx = fixture(&pool).await;
    let result = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, None, 1), line(9_999, None, 1)],
        &CirculationPolicy::default(),
        day(3, 1),
    )
    .await;
    assert_matches!(result, Err(CirculationError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn suspended_reader_cannot_submit(pool: PgPool) {
    let fx = fixture(&pool).await;
    circulation::create_suspension(
        &pool,
        &CreateSuspension {
            user_id: fx.reader,
            start_date: Some(day(3, 1)),
            end_date: day(3, 10),
            reason: "Repeated late returns".to_string(),
        },
        fx.librarian,
        day(3, 1),
    )
    .await
    .unwrap();

    let policy = CirculationPolicy::default();
    let during = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, None, 1)],
        &policy,
        day(3, 10),
    )
    .await;
    assert_matches!(during, Err(CirculationError::Core(CoreError::Forbidden(_))));

    let after = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, None, 1)],
        &policy,
        day(3, 11),
    )
    .await;
    assert!(after.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
async fn active_loan_cap_blocks_new_requests(pool: PgPool) {
    let fx = fixture(&pool).await;
    let policy = CirculationPolicy {
        max_active_loans: 1,
        ..CirculationPolicy::default()
    };
    let request = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, None, 1)],
        &policy,
        day(3, 1),
    )
    .await
    .unwrap();
    circulation::approve_request(&pool, request.request.id, fx.librarian, &policy, day(3, 1))
        .await
        .unwrap();

    let second = circulation::submit_request(
        &pool,
        fx.reader,
        &[line(fx.book, None, 1)],
        &policy,
        day(3, 2),
    )
    .await;
    assert_matches!(second, Err(CirculationError::Core(CoreError::Conflict(_))));
}

// ---------------------------------------------------------------------------
// Returns, renewals, losses
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn on_time_return_restocks_without_penalty(pool: PgPool) {
    let fx = fixture(&pool).await;
    let loan_id = issue_loan(&pool, &fx, 2, day(3, 1)).await;
    let item_id = LoanRepo::list_items(&pool, loan_id).await.unwrap()[0].id;

    let settlement = circulation::return_loan(
        &pool,
        loan_id,
        fx.librarian,
        &[ReturnItemCondition {
            loan_item_id: item_id,
            condition: "Good".to_string(),
        }],
        &CirculationPolicy::default(),
        day(3, 15),
    )
    .await
    .unwrap();

    assert_eq!(settlement.loan.status(), Some(LoanStatus::Returned));
    assert_eq!(settlement.loan.return_date, Some(day(3, 15)));
    assert!(settlement.penalty.is_none());
    assert_eq!(available(&pool, fx.stock).await, 3);

    let items = LoanRepo::list_items(&pool, loan_id).await.unwrap();
    assert_eq!(items[0].condition_in.as_deref(), Some("Good"));
}

#[sqlx::test(migrations = "./migrations")]
async fn late_return_raises_penalty(pool: PgPool) {
    let fx = fixture(&pool).await;
    let loan_id = issue_loan(&pool, &fx, 1, day(3, 1)).await;

    let settlement = circulation::return_loan(
        &pool,
        loan_id,
        fx.librarian,
        &[],
        &CirculationPolicy::default(),
        day(3, 19),
    )
    .await
    .unwrap();

    assert_eq!(settlement.loan.status(), Some(LoanStatus::LateReturned));
    let penalty = settlement.penalty.expect("late return must raise a penalty");
    assert_eq!(penalty.reason_id, PenaltyReason::LateReturn.id());
    assert_eq!(penalty.days_late, Some(4));
    assert_eq!(penalty.amount_cents, 200);
    assert_eq!(penalty.user_id, fx.reader);
    assert_eq!(available(&pool, fx.stock).await, 3);

    let returned_again = circulation::return_loan(
        &pool,
        loan_id,
        fx.librarian,
        &[],
        &CirculationPolicy::default(),
        day(3, 20),
    )
    .await;
    assert_matches!(
        returned_again,
        Err(CirculationError::Core(CoreError::Conflict(_)))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn return_rejects_foreign_loan_items(pool: PgPool) {
    let fx = fixture(&pool).await;
    let loan_id = issue_loan(&pool, &fx, 1, day(3, 1)).await;

    let result = circulation::return_loan(
        &pool,
        loan_id,
        fx.librarian,
        &[ReturnItemCondition {
            loan_item_id: 424_242,
            condition: "Torn".to_string(),
        }],
        &CirculationPolicy::default(),
        day(3, 5),
    )
    .await;
    assert_matches!(result, Err(CirculationError::Core(CoreError::Validation(_))));
    assert_eq!(available(&pool, fx.stock).await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn renewal_extends_due_date_until_cap(pool: PgPool) {
    let fx = fixture(&pool).await;
    let loan_id = issue_loan(&pool, &fx, 1, day(3, 1)).await;
    let policy = CirculationPolicy::default();
    let owner = Actor {
        id: fx.reader,
        is_librarian: false,
    };

    let first = circulation::renew_loan(&pool, loan_id, owner, &policy, day(3, 10))
        .await
        .unwrap();
    assert_eq!(first.due_date, day(3, 29));
    assert_eq!(first.renewal_count, 1);

    let second = circulation::renew_loan(&pool, loan_id, owner, &policy, day(3, 20))
        .await
        .unwrap();
    assert_eq!(second.due_date, day(4, 12));

    assert_matches!(
        circulation::renew_loan(&pool, loan_id, owner, &policy, day(3, 21)).await,
        Err(CirculationError::Core(CoreError::Conflict(_)))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn renewal_refused_for_strangers_and_overdue_loans(pool: PgPool) {
    let fx = fixture(&pool).await;
    let stranger = new_user(&pool, "stranger", "reader").await;
    let loan_id = issue_loan(&pool, &fx, 1, day(3, 1)).await;
    let policy = CirculationPolicy::default();

    assert_matches!(
        circulation::renew_loan(
            &pool,
            loan_id,
            Actor {
                id: stranger,
                is_librarian: false
            },
            &policy,
            day(3, 5)
        )
        .await,
        Err(CirculationError::Core(CoreError::Forbidden(_)))
    );

    assert_matches!(
        circulation::renew_loan(
            &pool,
            loan_id,
            Actor {
                id: fx.librarian,
                is_librarian: true
            },
            &policy,
            day(3, 16)
        )
        .await,
        Err(CirculationError::Core(CoreError::Conflict(_)))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn lost_loan_writes_off_copies_and_charges_per_copy(pool: PgPool) {
    let fx = fixture(&pool).await;
    let loan_id = issue_loan(&pool, &fx, 2, day(3, 1)).await;

    let settlement = circulation::declare_lost(
        &pool,
        loan_id,
        fx.librarian,
        &CirculationPolicy::default(),
    )
    .await
    .unwrap();

    assert_eq!(settlement.loan.status(), Some(LoanStatus::Lost));
    let penalty = settlement.penalty.unwrap();
    assert_eq!(penalty.reason_id, PenaltyReason::LostItem.id());
    assert_eq!(penalty.amount_cents, 5_000);

    let stock = StockRepo::find_by_id(&pool, fx.stock).await.unwrap().unwrap();
    assert_eq!(stock.total_quantity, 1);
    assert_eq!(stock.available_quantity, 1);
}

// ---------------------------------------------------------------------------
// Stock, penalties, reminders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn stock_delete_is_refused_while_copies_are_lent(pool: PgPool) {
    let fx = fixture(&pool).await;
    let spare = new_stock(&pool, fx.book, "en", 2).await;
    let loan_id = issue_loan(&pool, &fx, 1, day(3, 1)).await;
    let policy = CirculationPolicy::default();

    assert_matches!(
        circulation::delete_stock(&pool, fx.stock, fx.librarian).await,
        Err(CirculationError::Core(CoreError::Conflict(_)))
    );
    assert_eq!(available(&pool, fx.stock).await, 2);

    // Returned copies are back, but past loan items still reference the row.
    circulation::return_loan(&pool, loan_id, fx.librarian, &[], &policy, day(3, 5))
        .await
        .unwrap();
    assert_matches!(
        circulation::delete_stock(&pool, fx.stock, fx.librarian).await,
        Err(CirculationError::Database(_))
    );
    assert!(StockRepo::find_by_id(&pool, fx.stock).await.unwrap().is_some());

    circulation::delete_stock(&pool, spare, fx.librarian).await.unwrap();
    assert!(StockRepo::find_by_id(&pool, spare).await.unwrap().is_none());
    assert_matches!(
        circulation::delete_stock(&pool, spare, fx.librarian).await,
        Err(CirculationError::Core(CoreError::NotFound { .. }))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn resize_keeps_loaned_copies(pool: PgPool) {
    let fx = fixture(&pool).await;
    issue_loan(&pool, &fx, 2, day(3, 1)).await;

    let grown = circulation::update_stock(
        &pool,
        fx.stock,
        &UpdateStock {
            total_quantity: Some(6),
            condition_note: Some("Rebound".to_string()),
        },
        fx.librarian,
    )
    .await
    .unwrap();
    assert_eq!(grown.total_quantity, 6);
    assert_eq!(grown.available_quantity, 4);
    assert_eq!(grown.condition_note.as_deref(), Some("Rebound"));

    let shrink = circulation::update_stock(
        &pool,
        fx.stock,
        &UpdateStock {
            total_quantity: Some(1),
            condition_note: None,
        },
        fx.librarian,
    )
    .await;
    assert_matches!(shrink, Err(CirculationError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn penalty_can_be_settled_once(pool: PgPool) {
    let fx = fixture(&pool).await;
    let penalty = circulation::create_penalty(
        &pool,
        &CreatePenalty {
            user_id: fx.reader,
            loan_id: None,
            reason: None,
            amount_cents: 1_000,
            note: Some("Water damage".to_string()),
        },
        fx.librarian,
    )
    .await
    .unwrap();
    assert_eq!(penalty.reason_id, PenaltyReason::DamagedItem.id());

    let paid = circulation::settle_penalty(&pool, penalty.id, fx.librarian, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.payment_status_id, PaymentStatus::Paid.id());
    assert_eq!(paid.validated_by, Some(fx.librarian));
    assert!(paid.validated_at.is_some());

    assert_matches!(
        circulation::settle_penalty(&pool, penalty.id, fx.librarian, PaymentStatus::Waived).await,
        Err(CirculationError::Core(CoreError::Conflict(_)))
    );

    let stored = PenaltyRepo::find_by_id(&pool, penalty.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status_id, PaymentStatus::Paid.id());
}

/// Dates years ahead of the wall clock, so only the injected `today` matters.
fn future_day(m: u32, d: u32) -> Date {
    Date::from_ymd_opt(2031, m, d).unwrap()
}

async fn due_reminders_for(pool: &PgPool, user_id: DbId) -> Vec<DbId> {
    NotificationRepo::list_for_user(pool, user_id, false, 50, 0)
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n.kind == "due_reminder")
        .filter_map(|n| n.loan_id)
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn due_reminder_is_sent_once_per_loan(pool: PgPool) {
    let fx = fixture(&pool).await;
    let loan_id = issue_loan(&pool, &fx, 1, future_day(3, 1)).await;
    let policy = CirculationPolicy::default();

    // Due 03-15; the reminder window opens on 03-13.
    let early = circulation::send_due_reminders(&pool, &policy, future_day(3, 12))
        .await
        .unwrap();
    assert_eq!(early, 0);

    let sent = circulation::send_due_reminders(&pool, &policy, future_day(3, 13))
        .await
        .unwrap();
    assert_eq!(sent, 1);

    for today in [future_day(3, 13), future_day(3, 14), future_day(3, 15)] {
        let again = circulation::send_due_reminders(&pool, &policy, today)
            .await
            .unwrap();
        assert_eq!(again, 0, "loan reminded again on {today}");
    }

    assert_eq!(due_reminders_for(&pool, fx.reader).await, vec![loan_id]);
}

#[sqlx::test(migrations = "./migrations")]
async fn renewed_loan_is_not_reminded_twice(pool: PgPool) {
    let fx = fixture(&pool).await;
    let loan_id = issue_loan(&pool, &fx, 1, future_day(3, 1)).await;
    let policy = CirculationPolicy::default();

    let sent = circulation::send_due_reminders(&pool, &policy, future_day(3, 13))
        .await
        .unwrap();
    assert_eq!(sent, 1);

    let owner = Actor {
        id: fx.reader,
        is_librarian: false,
    };
    let renewed = circulation::renew_loan(&pool, loan_id, owner, &policy, future_day(3, 14))
        .await
        .unwrap();
    assert_eq!(renewed.due_date, future_day(3, 29));

    // The new window opens on 03-27.
    let after_renewal = circulation::send_due_reminders(&pool, &policy, future_day(3, 27))
        .await
        .unwrap();
    assert_eq!(after_renewal, 0);

    assert_eq!(due_reminders_for(&pool, fx.reader).await, vec![loan_id]);
}

#[sqlx::test(migrations = "./migrations")]
async fn due_reminders_skip_returned_loans(pool: PgPool) {
    let fx = fixture(&pool).await;
    let loan_id = issue_loan(&pool, &fx, 1, future_day(3, 1)).await;
    let policy = CirculationPolicy::default();

    circulation::return_loan(&pool, loan_id, fx.librarian, &[], &policy, future_day(3, 10))
        .await
        .unwrap();

    let sent = circulation::send_due_reminders(&pool, &policy, future_day(3, 13))
        .await
        .unwrap();
    assert_eq!(sent, 0);
    assert!(due_reminders_for(&pool, fx.reader).await.is_empty());
}
