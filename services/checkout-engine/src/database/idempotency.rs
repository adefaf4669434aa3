//! Stored checkout attempts keyed by a client-supplied idempotency key.

use crate::errors::{CheckoutEngineError, Result};
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct StoredRequest {
    pub idempotency_key: String,
    pub request_hash: String,
    pub order_id: Option<Uuid>,
    /// Serialized confirmation; set in the same transaction as the order.
    pub response: Option<String>,
    pub created_at: i64,
}

#[derive(Debug)]
pub enum Claim {
    /// The key is new and now belongs to the current transaction.
    Claimed,
    /// The key was used before within the retention window.
    Existing(StoredRequest),
}

/// Drop keys older than `cutoff` (unix seconds).
pub async fn purge_expired(conn: &mut SqliteConnection, cutoff: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM checkout_requests WHERE created_at < ?")
        .bind(cutoff)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn claim(
    conn: &mut SqliteConnection,
    key: &str,
    request_hash: &str,
    now: i64,
) -> Result<Claim> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO checkout_requests (idempotency_key, request_hash, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (idempotency_key) DO NOTHING
        "#,
    )
    .bind(key)
    .bind(request_hash)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if inserted == 1 {
        return Ok(Claim::Claimed);
    }

    let existing = find(&mut *conn, key).await?.ok_or_else(|| {
        CheckoutEngineError::Internal(format!("idempotency key {} vanished after conflict", key))
    })?;

    Ok(Claim::Existing(existing))
}

pub async fn complete(
    conn: &mut SqliteConnection,
    key: &str,
    order_id: Uuid,
    response: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE checkout_requests SET order_id = ?, response = ? WHERE idempotency_key = ?",
    )
    .bind(order_id)
    .bind(response)
    .bind(key)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn find<'e, E>(executor: E, key: &str) -> Result<Option<StoredRequest>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let stored = sqlx::query_as::<_, StoredRequest>(
        r#"
        SELECT idempotency_key, request_hash, order_id, response, created_at
        FROM checkout_requests
        WHERE idempotency_key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(executor)
    .await?;

    Ok(stored)
}
