use std::sync::Arc;

use crate::storage::errors::StorageError;

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore};

/// Build a cache client from a URL.
///
/// `memory` gives a process-local store; `redis://` and `rediss://` connect to
/// Redis and verify the connection before returning.
pub async fn connect_cache_store(url: &str) -> Result<Arc<dyn CacheStore>, StorageError> {
    let store_type = CacheStoreType::from_url(url)?;

    tracing::info!(
        "Initializing cache store with type: {:?}, url: {}",
        store_type,
        url
    );

    let store: Arc<dyn CacheStore> = match store_type {
        CacheStoreType::Memory => Arc::new(InMemoryCacheStore::new()),
        CacheStoreType::Redis => {
            let store = RedisCacheStore::open(url).map_err(|e| {
                tracing::error!("Failed to create Redis client: {}", e);
                e
            })?;
            store.init().await.map_err(|e| {
                tracing::error!("Failed to connect to Redis: {}", e);
                e
            })?;
            Arc::new(store)
        }
    };

    tracing::info!("Connected to cache store: type={:?}, url={}", store_type, url);

    Ok(store)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheStoreType {
    Memory,
    Redis,
}

impl CacheStoreType {
    fn from_url(url: &str) -> Result<Self, StorageError> {
        if url == "memory" {
            Ok(Self::Memory)
        } else if url.starts_with("redis://") || url.starts_with("rediss://") {
            Ok(Self::Redis)
        } else {
            Err(StorageError::Storage(format!(
                "Unsupported cache store url: {url}. Supported are 'memory' and 'redis://'"
            )))
        }
    }
}
