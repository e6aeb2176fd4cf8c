use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

use super::types::{CacheStore, InMemoryCacheStore, MemoryEntry};

impl InMemoryCacheStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory generic cache store");
        Self {
            entry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, MemoryEntry>>, StorageError> {
        self.entry
            .lock()
            .map_err(|_| StorageError::Storage("In-memory cache lock poisoned".to_string()))
    }

    /// Number of live entries, expired ones excluded.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.lock()
            .map(|map| map.values().filter(|e| e.expires_at > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn expire_now(&self, key: &str) {
        if let Ok(mut map) = self.lock() {
            if let Some(entry) = map.get_mut(key) {
                entry.expires_at = Utc::now() - Duration::seconds(1);
            }
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(()) // Nothing to initialize for in-memory store
    }

    async fn put_with_ttl(
        &self,
        key: &str,
        value: CacheData,
        ttl: u64,
    ) -> Result<(), StorageError> {
        // TTLs beyond the calendar never expire
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.lock()?.insert(
            key.to_string(),
            MemoryEntry {
                data: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<CacheData>, StorageError> {
        let mut map = self.lock()?;
        match map.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.data.clone())),
            Some(_) => {
                tracing::debug!("Evicting expired cache entry: {}", key);
                map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }
}
