mod config;
mod postgres;
mod session_store;
mod sqlite;
mod types;

pub use session_store::SqlSessionStore;
pub use types::{DataStore, PostgresDataStore, SqliteDataStore};

/// Single-connection in-memory pool; every connection would otherwise get its
/// own empty database.
#[cfg(test)]
pub(crate) async fn test_sqlite_pool() -> sqlx::SqlitePool {
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool")
}
