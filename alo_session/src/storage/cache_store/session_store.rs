use async_trait::async_trait;
use std::sync::Arc;

use crate::session::SessionConfig;
use crate::storage::errors::StorageError;
use crate::storage::types::{CacheData, SessionStore};

use super::types::CacheStore;

/// Session store on top of a key-value cache with native expiry.
///
/// Entries live under `key_prefix + session_id` and expire after the session
/// timeout, so garbage collection is left to the cache. Prefix and timeout are
/// taken from the config at construction; sessions started with a config that
/// disagrees on either are refused.
#[derive(Clone)]
pub struct CacheSessionStore {
    cache: Arc<dyn CacheStore>,
    prefix: String,
    ttl: u64,
}

impl std::fmt::Debug for CacheSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSessionStore")
            .field("prefix", &self.prefix)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl CacheSessionStore {
    pub fn new(cache: Arc<dyn CacheStore>, config: &SessionConfig) -> Self {
        Self {
            cache,
            prefix: config.key_prefix().to_string(),
            ttl: config.timeout(),
        }
    }

    /// Build a store from a cache URL: `memory` or `redis://…`.
    pub async fn connect(url: &str, config: &SessionConfig) -> Result<Self, StorageError> {
        let cache = super::config::connect_cache_store(url).await?;
        Ok(Self::new(cache, config))
    }

    fn make_key(&self, session_id: &str) -> String {
        format!("{}{}", self.prefix, session_id)
    }
}

#[async_trait]
impl SessionStore for CacheSessionStore {
    async fn init(&self) -> Result<(), StorageError> {
        self.cache.init().await
    }

    async fn on_start(&self, config: &SessionConfig) -> Result<(), StorageError> {
        if config.key_prefix() != self.prefix || config.timeout() != self.ttl {
            return Err(StorageError::Storage(format!(
                "Session config (prefix {:?}, timeout {}) does not match the cache store (prefix {:?}, timeout {})",
                config.key_prefix(),
                config.timeout(),
                self.prefix,
                self.ttl
            )));
        }
        Ok(())
    }

    async fn read(&self, session_id: &str) -> Result<Option<String>, StorageError> {
        let value = self.cache.get(&self.make_key(session_id)).await?;
        Ok(value.map(|data| data.value))
    }

    async fn write(&self, session_id: &str, data: &str) -> Result<(), StorageError> {
        self.cache
            .put_with_ttl(
                &self.make_key(session_id),
                CacheData {
                    value: data.to_string(),
                },
                self.ttl,
            )
            .await
    }

    async fn destroy(&self, session_id: &str) -> Result<(), StorageError> {
        // A failed delete only leaves an entry the TTL will reap anyway
        if let Err(e) = self.cache.remove(&self.make_key(session_id)).await {
            tracing::warn!("Failed to remove session {} from cache: {}", session_id, e);
        }
        Ok(())
    }

    async fn id_exists(&self, session_id: &str) -> Result<bool, StorageError> {
        self.cache.exists(&self.make_key(session_id)).await
    }
}
