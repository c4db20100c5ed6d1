//! HTTP-level tests for the circulation workflow: requests, approval,
//! renewal, check-in, penalties, suspensions and notifications.

mod common;

use axum::http::StatusCode;
use axum::Router;
use biblio_core::roles::{ROLE_ADMIN, ROLE_READER, ROLE_SECRETARY};
use biblio_core::types::DbId;
use chrono::{Duration, Utc};
use common::{
    body_json, delete_auth, get_auth, post_auth, post_json_auth, user_with_token,
};
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a book with one French stock row of `copies` through the API.
async fn shelve_book(app: &Router, librarian: &str, title: &str, copies: i32) -> (DbId, DbId) {
    let response = post_json_auth(
        app.clone(),
        "/api/v1/books",
        json!({ "title": title }),
        librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let book_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/books/{book_id}/stocks"),
        json!({ "language": "fr", "total_quantity": copies }),
        librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let stock_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    (book_id, stock_id)
}

async fn submit(app: &Router, reader: &str, book_id: DbId, quantity: i32) -> Value {
    let response = post_json_auth(
        app.clone(),
        "/api/v1/loan-requests",
        json!({ "items": [{ "book_id": book_id, "quantity": quantity }] }),
        reader,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Submit and approve a one-line request; returns the loan JSON.
async fn borrow(app: &Router, reader: &str, librarian: &str, book_id: DbId) -> Value {
    let request = submit(app, reader, book_id, 1).await;
    let response = post_auth(
        app.clone(),
        &format!("/api/v1/loan-requests/{}/approve", request["id"]),
        librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["loan"].clone()
}

async fn available(app: &Router, token: &str, book_id: DbId) -> i64 {
    let response = get_auth(app.clone(), &format!("/api/v1/books/{book_id}"), token).await;
    body_json(response).await["data"]["available_copies"]
        .as_i64()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Requests and approval
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn approval_issues_loan_and_reserves_stock(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (reader_id, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Bel-Ami", 2).await;

    let request = submit(&app, &reader, book_id, 2).await;
    assert_eq!(request["status"], "pending");
    assert_eq!(request["requester_id"], reader_id);
    assert_eq!(request["items"][0]["quantity"], 2);

    let response = post_auth(
        app.clone(),
        &format!("/api/v1/loan-requests/{}/approve", request["id"]),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let approval = body_json(response).await["data"].clone();
    assert_eq!(approval["request"]["status"], "approved");
    assert_eq!(approval["loan"]["status"], "active");
    assert_eq!(approval["loan"]["borrower_id"], reader_id);
    assert_eq!(approval["loan"]["is_overdue"], false);
    assert_eq!(approval["request"]["loan_id"], approval["loan"]["id"]);

    assert_eq!(available(&app, &reader, book_id).await, 0);

    // The reader sees the loan with its item.
    let loan_id = approval["loan"]["id"].as_i64().unwrap();
    let response = get_auth(app.clone(), &format!("/api/v1/loans/{loan_id}"), &reader).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await["data"].clone();
    assert_eq!(detail["items"][0]["title"], "Bel-Ami");
    assert_eq!(detail["items"][0]["quantity"], 2);
    assert_eq!(detail["penalties"].as_array().unwrap().len(), 0);

    // And an approval notification.
    let response = get_auth(app, "/api/v1/notifications/unread-count", &reader).await;
    assert_eq!(body_json(response).await["data"]["unread_count"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn approval_fails_without_enough_stock(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Zadig", 1).await;

    let request = submit(&app, &reader, book_id, 2).await;
    let response = post_auth(
        app.clone(),
        &format!("/api/v1/loan-requests/{}/approve", request["id"]),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Nothing moved and the request is still pending.
    assert_eq!(available(&app, &reader, book_id).await, 1);
    let response = get_auth(
        app,
        &format!("/api/v1/loan-requests/{}", request["id"]),
        &reader,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["status"], "pending");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reader_cannot_approve_or_see_other_requests(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (_, other) = user_with_token(&pool, &app, "otto", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Candide", 1).await;

    let request = submit(&app, &reader, book_id, 1).await;
    let uri = format!("/api/v1/loan-requests/{}", request["id"]);

    let response = post_auth(app.clone(), &format!("{uri}/approve"), &reader).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.clone(), &uri, &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_auth(app.clone(), &format!("{uri}/cancel"), &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Readers only ever list their own requests.
    let response = get_auth(app.clone(), "/api/v1/loan-requests", &other).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 0);

    let response = get_auth(app, "/api/v1/loan-requests?status=pending", &librarian).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rejection_requires_reason_and_is_final(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Nana", 1).await;

    let request = submit(&app, &reader, book_id, 1).await;
    let uri = format!("/api/v1/loan-requests/{}", request["id"]);

    let response = post_json_auth(
        app.clone(),
        &format!("{uri}/reject"),
        json!({ "reason": "  " }),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app.clone(),
        &format!("{uri}/reject"),
        json!({ "reason": "Reserved for a class" }),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rejected = body_json(response).await["data"].clone();
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["rejection_reason"], "Reserved for a class");

    // A decided request cannot be canceled or approved.
    let response = post_auth(app.clone(), &format!("{uri}/cancel"), &reader).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response = post_auth(app, &format!("{uri}/approve"), &librarian).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn requester_cancels_pending_request(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Le Horla", 1).await;

    let request = submit(&app, &reader, book_id, 1).await;
    let response = post_auth(
        app.clone(),
        &format!("/api/v1/loan-requests/{}/cancel", request["id"]),
        &reader,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "canceled");

    let response = get_auth(app, "/api/v1/loan-requests?status=bogus", &reader).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn empty_or_unknown_book_request_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;

    let response = post_json_auth(
        app.clone(),
        "/api/v1/loan-requests",
        json!({ "items": [] }),
        &reader,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app,
        "/api/v1/loan-requests",
        json!({ "items": [{ "book_id": 424_242 }] }),
        &reader,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn renewal_extends_due_date_until_cap(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Micromégas", 1).await;

    let loan = borrow(&app, &reader, &librarian, book_id).await;
    let uri = format!("/api/v1/loans/{}/renew", loan["id"]);
    let first_due = loan["due_date"].as_str().unwrap().to_string();

    let response = post_auth(app.clone(), &uri, &reader).await;
    assert_eq!(response.status(), StatusCode::OK);
    let renewed = body_json(response).await["data"].clone();
    assert_eq!(renewed["renewal_count"], 1);
    assert!(renewed["due_date"].as_str().unwrap() > first_due.as_str());

    let response = post_auth(app.clone(), &uri, &librarian).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Default policy allows two renewals.
    let response = post_auth(app, &uri, &reader).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn on_time_return_restores_stock(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Salammbô", 1).await;

    let loan = borrow(&app, &reader, &librarian, book_id).await;
    let uri = format!("/api/v1/loans/{}/return", loan["id"]);

    // Readers cannot check loans in.
    let response = post_auth(app.clone(), &uri, &reader).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_auth(app.clone(), &uri, &librarian).await;
    assert_eq!(response.status(), StatusCode::OK);
    let settlement = body_json(response).await["data"].clone();
    assert_eq!(settlement["loan"]["status"], "returned");
    assert!(settlement["penalty"].is_null());

    assert_eq!(available(&app, &reader, book_id).await, 1);

    // A closed loan cannot be returned again.
    let response = post_auth(app, &uri, &librarian).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn late_return_raises_penalty_that_can_be_paid(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (reader_id, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Thérèse Raquin", 1).await;

    let loan = borrow(&app, &reader, &librarian, book_id).await;
    let loan_id = loan["id"].as_i64().unwrap();

    let today = Utc::now().date_naive();
    sqlx::query("UPDATE loans SET loan_date = $2, due_date = $3 WHERE id = $1")
        .bind(loan_id)
        .bind(today - Duration::days(20))
        .bind(today - Duration::days(3))
        .execute(&pool)
        .await
        .unwrap();

    let response = get_auth(app.clone(), "/api/v1/loans?overdue=true", &librarian).await;
    let overdue = body_json(response).await["data"].clone();
    assert_eq!(overdue.as_array().unwrap().len(), 1);
    assert_eq!(overdue[0]["days_overdue"], 3);

    // Overdue loans cannot be renewed.
    let response = post_auth(app.clone(), &format!("/api/v1/loans/{loan_id}/renew"), &reader).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/loans/{loan_id}/return"),
        json!({ "conditions": [] }),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let settlement = body_json(response).await["data"].clone();
    assert_eq!(settlement["loan"]["status"], "late_returned");
    assert_eq!(settlement["penalty"]["days_late"], 3);
    assert_eq!(settlement["penalty"]["amount_cents"], 150);
    assert_eq!(settlement["penalty"]["user_id"], reader_id);

    let penalty_id = settlement["penalty"]["id"].as_i64().unwrap();

    let response = get_auth(app.clone(), "/api/v1/penalties?status=unpaid", &reader).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = get_auth(app.clone(), "/api/v1/dashboard/me", &reader).await;
    assert_eq!(body_json(response).await["data"]["unpaid_penalty_cents"], 150);

    let response = post_auth(app.clone(), &format!("/api/v1/penalties/{penalty_id}/pay"), &reader).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_auth(
        app.clone(),
        &format!("/api/v1/penalties/{penalty_id}/pay"),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let paid = body_json(response).await["data"].clone();
    assert_eq!(paid["payment_status_id"], 2);
    assert!(paid["validated_at"].is_string());

    // Settled penalties stay settled.
    let response = post_auth(
        app,
        &format!("/api/v1/penalties/{penalty_id}/waive"),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn lost_loan_writes_off_copies(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, stock_id) = shelve_book(&app, &librarian, "Atala", 2).await;

    let loan = borrow(&app, &reader, &librarian, book_id).await;
    let response = post_auth(
        app.clone(),
        &format!("/api/v1/loans/{}/lost", loan["id"]),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let settlement = body_json(response).await["data"].clone();
    assert_eq!(settlement["loan"]["status"], "lost");
    assert_eq!(settlement["penalty"]["amount_cents"], 2500);

    let response = get_auth(app.clone(), &format!("/api/v1/books/{book_id}/stocks"), &reader).await;
    let stocks = body_json(response).await["data"].clone();
    assert_eq!(stocks[0]["id"], stock_id);
    assert_eq!(stocks[0]["total_quantity"], 1);
    assert_eq!(stocks[0]["available_quantity"], 1);

    // The stock row is referenced by the loan, so it cannot be deleted.
    let response = delete_auth(app, &format!("/api/v1/stocks/{stock_id}"), &librarian).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn stock_on_loan_cannot_shrink_below_loaned_copies(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, stock_id) = shelve_book(&app, &librarian, "René", 2).await;

    borrow(&app, &reader, &librarian, book_id).await;

    let response = common::put_json_auth(
        app.clone(),
        &format!("/api/v1/stocks/{stock_id}"),
        json!({ "total_quantity": 0 }),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = delete_auth(app, &format!("/api/v1/stocks/{stock_id}"), &librarian).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Penalties, suspensions, notifications
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn manual_penalty_can_be_waived(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (reader_id, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (_, other) = user_with_token(&pool, &app, "otto", ROLE_READER).await;

    let response = post_json_auth(
        app.clone(),
        "/api/v1/penalties",
        json!({ "user_id": reader_id, "amount_cents": 0 }),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/penalties",
        json!({ "user_id": reader_id, "amount_cents": 800, "note": "Torn cover" }),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let penalty = body_json(response).await["data"].clone();
    assert_eq!(penalty["reason_id"], 3);
    let uri = format!("/api/v1/penalties/{}", penalty["id"]);

    let response = get_auth(app.clone(), &uri, &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = get_auth(app.clone(), &uri, &reader).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_auth(app.clone(), &format!("{uri}/waive"), &librarian).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["payment_status_id"], 3);

    let response = get_auth(app, "/api/v1/penalties?status=unpaid", &reader).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn suspension_blocks_requests_until_lifted(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (reader_id, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Lorenzaccio", 1).await;

    let end = Utc::now().date_naive() + Duration::days(7);
    let response = post_json_auth(
        app.clone(),
        "/api/v1/suspensions",
        json!({ "user_id": reader_id, "end_date": end, "reason": "Repeated late returns" }),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let suspension_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.clone(),
        "/api/v1/loan-requests",
        json!({ "items": [{ "book_id": book_id }] }),
        &reader,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Readers cannot manage suspensions.
    let response = get_auth(app.clone(), "/api/v1/suspensions", &reader).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.clone(), "/api/v1/suspensions?active=true", &librarian).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = delete_auth(
        app.clone(),
        &format!("/api/v1/suspensions/{suspension_id}"),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    submit(&app, &reader, book_id, 1).await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn suspension_end_must_not_precede_start(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (reader_id, _) = user_with_token(&pool, &app, "rita", ROLE_READER).await;

    let response = post_json_auth(
        app,
        "/api/v1/suspensions",
        json!({
            "user_id": reader_id,
            "start_date": "2026-05-10",
            "end_date": "2026-05-01",
            "reason": "Backwards",
        }),
        &librarian,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn notifications_are_private_and_can_be_marked_read(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (_, other) = user_with_token(&pool, &app, "otto", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Adolphe", 2).await;

    borrow(&app, &reader, &librarian, book_id).await;
    borrow(&app, &reader, &librarian, book_id).await;

    let response = get_auth(app.clone(), "/api/v1/notifications?unread_only=true", &reader).await;
    let notifications = body_json(response).await["data"].clone();
    assert_eq!(notifications.as_array().unwrap().len(), 2);
    let first_id = notifications[0]["id"].as_i64().unwrap();

    let response = post_auth(
        app.clone(),
        &format!("/api/v1/notifications/{first_id}/read"),
        &other,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_auth(
        app.clone(),
        &format!("/api/v1/notifications/{first_id}/read"),
        &reader,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["read_at"].is_string());

    let response = post_auth(app.clone(), "/api/v1/notifications/read-all", &reader).await;
    assert_eq!(body_json(response).await["data"]["updated"], 1);

    let response = get_auth(app, "/api/v1/notifications/unread-count", &reader).await;
    assert_eq!(body_json(response).await["data"]["unread_count"], 0);
}

// ---------------------------------------------------------------------------
// Dashboard and audit trail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn dashboard_and_audit_trail_reflect_activity(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, librarian) = user_with_token(&pool, &app, "libby", ROLE_SECRETARY).await;
    let (_, admin) = user_with_token(&pool, &app, "root", ROLE_ADMIN).await;
    let (_, reader) = user_with_token(&pool, &app, "rita", ROLE_READER).await;
    let (book_id, _) = shelve_book(&app, &librarian, "Corinne", 3).await;

    borrow(&app, &reader, &librarian, book_id).await;
    submit(&app, &reader, book_id, 1).await;

    let response = get_auth(app.clone(), "/api/v1/dashboard/stats", &reader).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.clone(), "/api/v1/dashboard/stats", &librarian).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await["data"].clone();
    assert_eq!(stats["total_books"], 1);
    assert_eq!(stats["total_copies"], 3);
    assert_eq!(stats["available_copies"], 2);
    assert_eq!(stats["active_loans"], 1);
    assert_eq!(stats["pending_requests"], 1);

    let response = get_auth(app.clone(), "/api/v1/dashboard/me", &reader).await;
    let me = body_json(response).await["data"].clone();
    assert_eq!(me["active_loans"], 1);
    assert_eq!(me["pending_requests"], 1);

    // Only admins read the audit trail.
    let response = get_auth(app.clone(), "/api/v1/audit-logs", &librarian).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(
        app,
        "/api/v1/audit-logs?entity_type=loan_request&limit=10",
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let logs = body_json(response).await["data"].clone();
    let actions: Vec<&str> = logs
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"request_created"));
    assert!(actions.contains(&"request_approved"));
}
