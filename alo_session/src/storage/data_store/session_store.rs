use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::session::{SessionConfig, is_sql_identifier};
use crate::storage::errors::StorageError;
use crate::storage::types::SessionStore;

use super::postgres::{
    create_tables_postgres, destroy_postgres, gc_postgres, id_exists_postgres, read_postgres,
    validate_session_table_postgres, write_postgres,
};
use super::sqlite::{
    create_tables_sqlite, destroy_sqlite, gc_sqlite, id_exists_sqlite, read_sqlite,
    validate_session_table_sqlite, write_sqlite,
};
use super::types::{DataStore, PostgresDataStore, SqliteDataStore};

/// Session store backed by a relational table.
///
/// One row per session: `id`, encoded `data` and the last `access` time used
/// for garbage collection. The table is created on first use.
#[derive(Clone)]
pub struct SqlSessionStore {
    store: Arc<dyn DataStore>,
    table: String,
    tables_ready: Arc<OnceCell<()>>,
}

impl std::fmt::Debug for SqlSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = if self.store.as_sqlite().is_some() {
            "sqlite"
        } else if self.store.as_postgres().is_some() {
            "postgres"
        } else {
            "unknown"
        };
        f.debug_struct("SqlSessionStore")
            .field("backend", &backend)
            .field("table", &self.table)
            .finish()
    }
}

impl SqlSessionStore {
    pub fn new(store: Arc<dyn DataStore>, table: &str) -> Result<Self, StorageError> {
        // The table name is interpolated into SQL text
        if !is_sql_identifier(table) {
            return Err(StorageError::Storage(format!(
                "Invalid table name: {table:?}"
            )));
        }

        Ok(Self {
            store,
            table: table.to_string(),
            tables_ready: Arc::new(OnceCell::new()),
        })
    }

    pub fn sqlite(pool: sqlx::SqlitePool, table: &str) -> Result<Self, StorageError> {
        Self::new(Arc::new(SqliteDataStore::new(pool)), table)
    }

    pub fn postgres(pool: sqlx::PgPool, table: &str) -> Result<Self, StorageError> {
        Self::new(Arc::new(PostgresDataStore::new(pool)), table)
    }

    /// Connect from a database URL (`sqlite:…` or `postgres://…`), using the
    /// table named in `config`, and run [`SessionStore::init`].
    pub async fn connect(url: &str, config: &SessionConfig) -> Result<Self, StorageError> {
        let store = super::config::connect_data_store(url).await?;
        let store = Self::new(store, config.table_name())?;
        store.init().await?;
        Ok(store)
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    async fn ensure_tables(&self) -> Result<(), StorageError> {
        self.tables_ready
            .get_or_try_init(|| async {
                if let Some(pool) = self.store.as_sqlite() {
                    create_tables_sqlite(pool, &self.table).await
                } else if let Some(pool) = self.store.as_postgres() {
                    create_tables_postgres(pool, &self.table).await
                } else {
                    Err(unsupported())
                }
            })
            .await?;
        Ok(())
    }
}

fn unsupported() -> StorageError {
    StorageError::Storage("Unsupported database type".to_string())
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    async fn init(&self) -> Result<(), StorageError> {
        self.ensure_tables().await?;

        if let Some(pool) = self.store.as_sqlite() {
            validate_session_table_sqlite(pool, &self.table).await
        } else if let Some(pool) = self.store.as_postgres() {
            validate_session_table_postgres(pool, &self.table).await
        } else {
            Err(unsupported())
        }
    }

    async fn on_start(&self, _config: &SessionConfig) -> Result<(), StorageError> {
        self.ensure_tables().await
    }

    async fn read(&self, session_id: &str) -> Result<Option<String>, StorageError> {
        self.ensure_tables().await?;

        if let Some(pool) = self.store.as_sqlite() {
            read_sqlite(pool, &self.table, session_id).await
        } else if let Some(pool) = self.store.as_postgres() {
            read_postgres(pool, &self.table, session_id).await
        } else {
            Err(unsupported())
        }
    }

    async fn write(&self, session_id: &str, data: &str) -> Result<(), StorageError> {
        self.ensure_tables().await?;
        let now = Utc::now();

        if let Some(pool) = self.store.as_sqlite() {
            write_sqlite(pool, &self.table, session_id, data, now).await
        } else if let Some(pool) = self.store.as_postgres() {
            write_postgres(pool, &self.table, session_id, data, now).await
        } else {
            Err(unsupported())
        }
    }

    async fn destroy(&self, session_id: &str) -> Result<(), StorageError> {
        self.ensure_tables().await?;

        if let Some(pool) = self.store.as_sqlite() {
            destroy_sqlite(pool, &self.table, session_id).await
        } else if let Some(pool) = self.store.as_postgres() {
            destroy_postgres(pool, &self.table, session_id).await
        } else {
            Err(unsupported())
        }
    }

    async fn id_exists(&self, session_id: &str) -> Result<bool, StorageError> {
        self.ensure_tables().await?;

        if let Some(pool) = self.store.as_sqlite() {
            id_exists_sqlite(pool, &self.table, session_id).await
        } else if let Some(pool) = self.store.as_postgres() {
            id_exists_postgres(pool, &self.table, session_id).await
        } else {
            Err(unsupported())
        }
    }

    async fn gc(&self, max_lifetime: u64) -> Result<u64, StorageError> {
        self.ensure_tables().await?;
        let cutoff = i64::try_from(max_lifetime)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let removed = if let Some(pool) = self.store.as_sqlite() {
            gc_sqlite(pool, &self.table, cutoff).await?
        } else if let Some(pool) = self.store.as_postgres() {
            gc_postgres(pool, &self.table, cutoff).await?
        } else {
            return Err(unsupported());
        };

        tracing::debug!("Session gc removed {} rows from {}", removed, self.table);
        Ok(removed)
    }
}
