use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::storage::errors::StorageError;
use crate::storage::schema_validation::validate_sqlite_table_schema;

pub(super) async fn create_tables_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            id TEXT PRIMARY KEY NOT NULL,
            data TEXT NOT NULL,
            access TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    // SQLite qualifies the index, not the indexed table
    let statement = match table_name.split_once('.') {
        Some((schema, table)) => format!(
            "CREATE INDEX IF NOT EXISTS {schema}.{} ON {table}(access)",
            index_name(table)
        ),
        None => format!(
            "CREATE INDEX IF NOT EXISTS {} ON {table_name}(access)",
            index_name(table_name)
        ),
    };
    sqlx::query(&statement).execute(pool).await?;

    Ok(())
}

pub(super) async fn validate_session_table_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
) -> Result<(), StorageError> {
    let expected_columns = [("id", "TEXT"), ("data", "TEXT"), ("access", "TIMESTAMP")];

    validate_sqlite_table_schema(pool, table_name, &expected_columns, StorageError::Storage).await
}

pub(super) async fn read_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    session_id: &str,
) -> Result<Option<String>, StorageError> {
    let data = sqlx::query_scalar::<_, String>(&format!(
        "SELECT data FROM {table_name} WHERE id = ?"
    ))
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(data)
}

pub(super) async fn write_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    session_id: &str,
    data: &str,
    access: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {table_name} (id, data, access)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            data = excluded.data,
            access = excluded.access
        "#
    ))
    .bind(session_id)
    .bind(data)
    .bind(access)
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn destroy_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    session_id: &str,
) -> Result<(), StorageError> {
    sqlx::query(&format!("DELETE FROM {table_name} WHERE id = ?"))
        .bind(session_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub(super) async fn id_exists_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    session_id: &str,
) -> Result<bool, StorageError> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table_name} WHERE id = ?"
    ))
    .bind(session_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

pub(super) async fn gc_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    cutoff: DateTime<Utc>,
) -> Result<u64, StorageError> {
    let result = sqlx::query(&format!("DELETE FROM {table_name} WHERE access < ?"))
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Index names cannot carry a schema qualifier, so dots are flattened.
pub(super) fn index_name(table_name: &str) -> String {
    format!("idx_{}_access", table_name.replace('.', "_"))
}
