use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::storage::errors::StorageError;

use super::types::{DataStore, PostgresDataStore, SqliteDataStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataStoreType {
    Sqlite,
    Postgres,
}

impl DataStoreType {
    fn from_url(url: &str) -> Result<Self, StorageError> {
        if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else {
            Err(StorageError::Storage(format!(
                "Unsupported data store url: {url}. Supported are 'sqlite:' and 'postgres://'"
            )))
        }
    }
}

/// In-memory SQLite databases live and die with a connection, so they get a
/// single connection that is never recycled.
fn is_sqlite_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open a connection pool for a `sqlite:` or `postgres://` URL.
pub(super) async fn connect_data_store(url: &str) -> Result<Arc<dyn DataStore>, StorageError> {
    let store_type = DataStoreType::from_url(url)?;

    tracing::info!("Initializing data store with type: {:?}", store_type);

    let store: Arc<dyn DataStore> = match store_type {
        DataStoreType::Sqlite => {
            let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
            let pool = if is_sqlite_memory(url) {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(opts)
                    .await?
            } else {
                SqlitePoolOptions::new().connect_with(opts).await?
            };
            Arc::new(SqliteDataStore::new(pool))
        }
        DataStoreType::Postgres => {
            let pool = sqlx::PgPool::connect(url).await.map_err(|e| {
                tracing::error!("Failed to connect to Postgres: {}", e);
                e
            })?;
            Arc::new(PostgresDataStore::new(pool))
        }
    };

    tracing::info!("Connected to data store: type={:?}", store_type);

    Ok(store)
}
