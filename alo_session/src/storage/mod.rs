mod cache_store;
mod data_store;
mod errors;
mod schema_validation;
mod types;

pub use cache_store::{
    CacheSessionStore, CacheStore, InMemoryCacheStore, RedisCacheStore, connect_cache_store,
};
pub use data_store::{DataStore, PostgresDataStore, SqlSessionStore, SqliteDataStore};
pub use errors::StorageError;
pub use types::{CacheData, SessionStore};
