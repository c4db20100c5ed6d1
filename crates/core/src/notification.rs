//! In-app notification types and message text.

use crate::types::{Date, DbId};

pub const TYPE_APPROVAL: &str = "approval";
pub const TYPE_REJECTION: &str = "rejection";
pub const TYPE_DUE_REMINDER: &str = "due_reminder";
pub const TYPE_PENALTY: &str = "penalty";
pub const TYPE_SUSPENSION: &str = "suspension";

/// The only delivery channel: rows read by the client.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Title and body of a notification, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: &'static str,
    pub title: String,
    pub body: String,
}

pub fn request_approved(request_id: DbId, due: Date) -> Message {
    Message {
        kind: TYPE_APPROVAL,
        title: "Loan request approved".to_string(),
        body: format!(
            "Your loan request #{request_id} was approved. Collect your books at the desk; \
             they are due back on {due}."
        ),
    }
}

pub fn request_rejected(request_id: DbId, reason: &str) -> Message {
    Message {
        kind: TYPE_REJECTION,
        title: "Loan request rejected".to_string(),
        body: format!("Your loan request #{request_id} was rejected. Reason: {reason}"),
    }
}

pub fn due_reminder(loan_id: DbId, due: Date) -> Message {
    Message {
        kind: TYPE_DUE_REMINDER,
        title: "Loan due soon".to_string(),
        body: format!("Loan #{loan_id} is due back on {due}."),
    }
}

pub fn penalty_assessed(loan_id: Option<DbId>, amount_cents: i64, note: &str) -> Message {
    let amount = format_cents(amount_cents);
    let body = match (loan_id, note.is_empty()) {
        (Some(id), false) => format!("A penalty of {amount} was recorded on loan #{id}: {note}"),
        (Some(id), true) => format!("A penalty of {amount} was recorded on loan #{id}."),
        (None, false) => format!("A penalty of {amount} was recorded on your account: {note}"),
        (None, true) => format!("A penalty of {amount} was recorded on your account."),
    };
    Message {
        kind: TYPE_PENALTY,
        title: "Penalty assessed".to_string(),
        body,
    }
}

pub fn suspended(start: Date, end: Date, reason: &str) -> Message {
    Message {
        kind: TYPE_SUSPENSION,
        title: "Account suspended".to_string(),
        body: format!(
            "You cannot submit loan requests from {start} to {end}. Reason: {reason}"
        ),
    }
}

/// Render cents as a decimal amount, e.g. `1250` -> `"12.50"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
