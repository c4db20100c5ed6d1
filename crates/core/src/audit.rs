//! Audit trail constants and payload redaction.
//!
//! Lives in `core` so both repositories and handlers record the same action
//! names.

// ---------------------------------------------------------------------------
// Action constants
// ---------------------------------------------------------------------------

/// Known action names for audit log entries.
pub mod actions {
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const REQUEST_CREATED: &str = "request_created";
    pub const REQUEST_APPROVED: &str = "request_approved";
    pub const REQUEST_REJECTED: &str = "request_rejected";
    pub const REQUEST_CANCELED: &str = "request_canceled";
    pub const LOAN_CREATED: &str = "loan_created";
    pub const LOAN_RETURNED: &str = "loan_returned";
    pub const LOAN_RENEWED: &str = "loan_renewed";
    pub const LOAN_LOST: &str = "loan_lost";
    pub const PENALTY_CREATED: &str = "penalty_created";
    pub const PENALTY_PAID: &str = "penalty_paid";
    pub const PENALTY_WAIVED: &str = "penalty_waived";
    pub const SUSPENSION_CREATED: &str = "suspension_created";
    pub const SUSPENSION_DELETED: &str = "suspension_deleted";
    pub const ENTITY_CREATE: &str = "entity_create";
    pub const ENTITY_UPDATE: &str = "entity_update";
    pub const ENTITY_DELETE: &str = "entity_delete";
}

/// Entity type names recorded alongside each action.
pub mod entities {
    pub const USER: &str = "user";
    pub const AUTHOR: &str = "author";
    pub const CATEGORY: &str = "category";
    pub const BOOK: &str = "book";
    pub const BOOK_STOCK: &str = "book_stock";
    pub const LOAN_REQUEST: &str = "loan_request";
    pub const LOAN: &str = "loan";
    pub const PENALTY: &str = "penalty";
    pub const SUSPENSION: &str = "suspension";
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Fields that should be redacted from audit payloads before storage.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "authorization",
    "credential",
];

/// Redact sensitive keys from a JSON value, recursing into objects and arrays.
///
/// Any key containing one of [`SENSITIVE_FIELDS`] (case-insensitive) has its
/// value replaced with `"[REDACTED]"`.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}
