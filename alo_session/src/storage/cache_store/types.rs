use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

#[derive(Debug, Clone)]
pub(super) struct MemoryEntry {
    pub(super) data: CacheData,
    pub(super) expires_at: DateTime<Utc>,
}

/// Process-local cache with per-entry expiry. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheStore {
    pub(super) entry: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

#[derive(Debug, Clone)]
pub struct RedisCacheStore {
    pub(super) client: redis::Client,
}

/// Key-value client with per-entry expiry.
///
/// Keys are used verbatim; namespacing is the caller's business.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Initialize the store. This is called when the store is created.
    async fn init(&self) -> Result<(), StorageError>;

    /// Put a value into the store with a TTL in seconds.
    async fn put_with_ttl(&self, key: &str, value: CacheData, ttl: u64)
    -> Result<(), StorageError>;

    /// Get a value from the store. Non-string values read as `None`.
    async fn get(&self, key: &str) -> Result<Option<CacheData>, StorageError>;

    /// Remove a value from the store.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Whether a live value exists for the key.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}
