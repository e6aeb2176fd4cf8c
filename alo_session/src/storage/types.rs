use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::SessionConfig;
use crate::storage::errors::StorageError;

/// Data stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheData {
    pub value: String,
}

/// Persistence backend for session payloads.
///
/// Implementations only move opaque encoded payloads around. Policy decisions
/// (whether to persist at all, how to degrade on failure) belong to the
/// session handler that drives the store.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Prepare the backend (create tables, verify connectivity).
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Called every time a session bound to this store is started.
    async fn on_start(&self, _config: &SessionConfig) -> Result<(), StorageError> {
        Ok(())
    }

    /// Fetch the encoded payload for a session, `None` if there is none.
    async fn read(&self, session_id: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the encoded payload for a session.
    async fn write(&self, session_id: &str, data: &str) -> Result<(), StorageError>;

    /// Remove the stored payload for a session.
    async fn destroy(&self, session_id: &str) -> Result<(), StorageError>;

    /// Whether an entry exists for the session id.
    ///
    /// Errors here mean uniqueness could not be verified and must not be read
    /// as "does not exist".
    async fn id_exists(&self, session_id: &str) -> Result<bool, StorageError>;

    /// Remove entries not accessed for `max_lifetime` seconds and return how
    /// many were removed. Backends with native expiry keep the default.
    async fn gc(&self, _max_lifetime: u64) -> Result<u64, StorageError> {
        Ok(0)
    }
}
