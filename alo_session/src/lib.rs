//! alo_session - Pluggable server-side sessions
//!
//! Sessions are persisted through a [`SessionStore`]: a relational table
//! ([`SqlSessionStore`], SQLite or PostgreSQL) or a key-value cache with expiry
//! ([`CacheSessionStore`], Redis or in-memory). A [`SessionContext`] carries
//! the active session for one request, binds it to the client fingerprint and
//! keeps named CSRF [`Token`]s in it.

mod session;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

pub use session::{
    ExecutionMode, RequestInfo, Session, SessionConfig, SessionContext, SessionData,
    SessionError, SessionHandler, StartOutcome, Token,
};

pub use storage::{
    CacheData, CacheSessionStore, CacheStore, DataStore, InMemoryCacheStore, PostgresDataStore,
    RedisCacheStore, SessionStore, SqlSessionStore, SqliteDataStore, StorageError,
    connect_cache_store,
};

pub use utils::{HashAlgorithm, UtilError, gen_uniqid};
