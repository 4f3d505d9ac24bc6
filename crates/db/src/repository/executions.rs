//! Execution snapshot repository functions.
//!
//! `execution_snapshots` stores the full `history::ExecutionSnapshot` as a
//! JSON blob, alongside a handful of denormalised columns kept in sync on
//! every write so `workflow_name` / `status` / `started_at` can be filtered
//! on in SQL without unpacking JSON.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::ExecutionSnapshotRow};

/// Insert a new execution snapshot row.
pub async fn insert_snapshot(
    pool: &PgPool,
    execution_id: Uuid,
    workflow_name: &str,
    status: &str,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    snapshot: serde_json::Value,
) -> Result<(), DbError> {
    sqlx::query!(
        r#"
        INSERT INTO execution_snapshots
            (execution_id, workflow_name, status, started_at, ended_at, snapshot)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
        execution_id,
        workflow_name,
        status,
        started_at,
        ended_at,
        snapshot,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite an existing execution snapshot row in place.
pub async fn update_snapshot(
    pool: &PgPool,
    execution_id: Uuid,
    status: &str,
    ended_at: Option<DateTime<Utc>>,
    snapshot: serde_json::Value,
) -> Result<(), DbError> {
    let result = sqlx::query!(
        r#"
        UPDATE execution_snapshots
        SET status = $1, ended_at = $2, snapshot = $3
        WHERE execution_id = $4
        "#,
        status,
        ended_at,
        snapshot,
        execution_id,
    )
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Fetch a single execution snapshot row by id.
pub async fn get_snapshot(pool: &PgPool, execution_id: Uuid) -> Result<ExecutionSnapshotRow, DbError> {
    let row = sqlx::query_as!(
        ExecutionSnapshotRow,
        r#"
        SELECT execution_id, workflow_name, status, started_at, ended_at, snapshot
        FROM execution_snapshots
        WHERE execution_id = $1
        "#,
        execution_id,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Query execution snapshot rows, newest first, optionally narrowed by
/// workflow name and/or a `[from, to)` start-time window. Status filtering
/// is applied by the caller over the decoded `ExecutionSnapshot`s, since
/// `statuses` is a set and the aggregate queries scan the same window.
pub async fn query_snapshots(
    pool: &PgPool,
    workflow_name: Option<&str>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<ExecutionSnapshotRow>, DbError> {
    let rows = sqlx::query_as!(
        ExecutionSnapshotRow,
        r#"
        SELECT execution_id, workflow_name, status, started_at, ended_at, snapshot
        FROM execution_snapshots
        WHERE ($1::text IS NULL OR workflow_name = $1)
          AND ($2::timestamptz IS NULL OR started_at >= $2)
          AND ($3::timestamptz IS NULL OR started_at < $3)
        ORDER BY started_at DESC
        "#,
        workflow_name,
        from,
        to,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Permanently delete every snapshot whose `started_at` is older than
/// `cutoff`. Returns the number of rows removed.
pub async fn delete_older_than(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
    let result = sqlx::query!("DELETE FROM execution_snapshots WHERE started_at < $1", cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
