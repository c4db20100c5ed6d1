//! Repository for the append-only `audit_logs` table.

use sqlx::{PgExecutor, PgPool};
use biblio_core::audit::redact_sensitive_fields;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

const COLUMNS: &str =
    "id, actor_id, action, entity_type, entity_id, old_value, new_value, created_at";

pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append an entry. Sensitive keys in both payloads are redacted first.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        entry: &CreateAuditLog,
    ) -> Result<AuditLog, sqlx::Error> {
        let old_value = entry.old_value.as_ref().map(redact_sensitive_fields);
        let new_value = entry.new_value.as_ref().map(redact_sensitive_fields);

        let query = format!(
            "INSERT INTO audit_logs (actor_id, action, entity_type, entity_id, old_value, new_value)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.actor_id)
            .bind(entry.action)
            .bind(entry.entity_type)
            .bind(entry.entity_id)
            .bind(old_value)
            .bind(new_value)
            .fetch_one(executor)
            .await
    }

    /// Query entries, newest first. `limit` and `offset` are already clamped.
    pub async fn query(
        pool: &PgPool,
        params: &AuditQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE ($1::TEXT IS NULL OR action = $1)
               AND ($2::TEXT IS NULL OR entity_type = $2)
               AND ($3::BIGINT IS NULL OR actor_id = $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(&params.action)
            .bind(&params.entity_type)
            .bind(params.actor_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
