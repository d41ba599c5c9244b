use serde_json::Value;
use uuid::Uuid;

use crate::db::DbPool;

async fn insert(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: &str,
    resource: &str,
    metadata: Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_logs (id, user_id, action, resource, metadata) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record a write. `user_id` is `None` for anonymous callers such as the
/// public lead form. A failed write is logged and never fails the request
/// that triggered it.
pub async fn record(
    pool: &DbPool,
    user_id: impl Into<Option<Uuid>>,
    action: &str,
    resource: &str,
    metadata: Value,
) {
    if let Err(err) = insert(pool, user_id.into(), action, resource, metadata).await {
        tracing::warn!(error = %err, action, resource, "audit log failed");
    }
}
