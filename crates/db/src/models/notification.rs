//! In-app notification model.

use serde::Serialize;
use sqlx::FromRow;
use biblio_core::notification::Message;
use biblio_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub channel: String,
    pub loan_id: Option<DbId>,
    pub sent_at: Timestamp,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: DbId,
    pub loan_id: Option<DbId>,
    pub message: Message,
}
