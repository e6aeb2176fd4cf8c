use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::storage::errors::StorageError;
use crate::storage::schema_validation::validate_postgres_table_schema;

use super::sqlite::index_name;

pub(super) async fn create_tables_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            id TEXT PRIMARY KEY NOT NULL,
            data TEXT NOT NULL,
            access TIMESTAMPTZ NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    let index_name = index_name(table_name);
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS {index_name} ON {table_name}(access)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn validate_session_table_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
) -> Result<(), StorageError> {
    let expected_columns = [
        ("id", "text"),
        ("data", "text"),
        ("access", "timestamp with time zone"),
    ];

    // information_schema knows tables by their bare name
    let bare_name = table_name.rsplit('.').next().unwrap_or(table_name);

    validate_postgres_table_schema(pool, bare_name, &expected_columns, StorageError::Storage)
        .await
}

pub(super) async fn read_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
    session_id: &str,
) -> Result<Option<String>, StorageError> {
    let data = sqlx::query_scalar::<_, String>(&format!(
        "SELECT data FROM {table_name} WHERE id = $1"
    ))
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(data)
}

pub(super) async fn write_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
    session_id: &str,
    data: &str,
    access: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {table_name} (id, data, access)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET
            data = EXCLUDED.data,
            access = EXCLUDED.access
        "#
    ))
    .bind(session_id)
    .bind(data)
    .bind(access)
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn destroy_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
    session_id: &str,
) -> Result<(), StorageError> {
    sqlx::query(&format!("DELETE FROM {table_name} WHERE id = $1"))
        .bind(session_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub(super) async fn id_exists_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
    session_id: &str,
) -> Result<bool, StorageError> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table_name} WHERE id = $1"
    ))
    .bind(session_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

pub(super) async fn gc_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
    cutoff: DateTime<Utc>,
) -> Result<u64, StorageError> {
    let result = sqlx::query(&format!("DELETE FROM {table_name} WHERE access < $1"))
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
