//! Per-workflow secret repository functions.
//!
//! Values are stored already-encrypted by the caller; this layer never sees
//! plaintext.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::SecretRow};

pub async fn upsert_secret(
    pool: &PgPool,
    workflow_id: Uuid,
    key: &str,
    encrypted_value: &str,
) -> Result<SecretRow, DbError> {
    let id = Uuid::new_v4();

    let row = sqlx::query_as!(
        SecretRow,
        r#"
        INSERT INTO secrets (id, workflow_id, key, encrypted_value)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (workflow_id, key) DO UPDATE SET encrypted_value = EXCLUDED.encrypted_value
        RETURNING id, workflow_id, key, encrypted_value
        "#,
        id,
        workflow_id,
        key,
        encrypted_value,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch every secret belonging to a workflow.
pub async fn list_secrets(pool: &PgPool, workflow_id: Uuid) -> Result<Vec<SecretRow>, DbError> {
    let rows = sqlx::query_as!(
        SecretRow,
        r#"SELECT id, workflow_id, key, encrypted_value FROM secrets WHERE workflow_id = $1"#,
        workflow_id,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn delete_secret(pool: &PgPool, workflow_id: Uuid, key: &str) -> Result<(), DbError> {
    let result = sqlx::query!("DELETE FROM secrets WHERE workflow_id = $1 AND key = $2", workflow_id, key)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
