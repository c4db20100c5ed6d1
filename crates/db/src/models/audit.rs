//! Audit log model and query filter.
//!
//! Audit rows are append-only: no `updated_at`, no update or delete queries.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use biblio_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub actor_id: Option<DbId>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: DbId,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// Insert DTO. Payloads are redacted by the repository before storage.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub actor_id: Option<DbId>,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: DbId,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
}

impl CreateAuditLog {
    pub fn new(
        actor_id: Option<DbId>,
        action: &'static str,
        entity_type: &'static str,
        entity_id: DbId,
    ) -> Self {
        Self {
            actor_id,
            action,
            entity_type,
            entity_id,
            old_value: None,
            new_value: None,
        }
    }

    pub fn with_old(mut self, value: serde_json::Value) -> Self {
        self.old_value = Some(value);
        self
    }

    pub fn with_new(mut self, value: serde_json::Value) -> Self {
        self.new_value = Some(value);
        self
    }
}

/// Filter parameters for `GET /audit-logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub actor_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
