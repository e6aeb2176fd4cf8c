//! Stores and contexts shared by the session module tests

use async_trait::async_trait;
use http::HeaderMap;
use http::header::USER_AGENT;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::session::config::SessionConfig;
use crate::storage::{CacheSessionStore, InMemoryCacheStore, SessionStore, StorageError};

use super::context::SessionContext;

pub(crate) fn test_config() -> SessionConfig {
    SessionConfig::default()
}

/// Cache-backed store over a fresh in-memory cache
pub(crate) fn memory_store(config: &SessionConfig) -> Arc<CacheSessionStore> {
    Arc::new(CacheSessionStore::new(
        Arc::new(InMemoryCacheStore::new()),
        config,
    ))
}

/// Interactive context for a client identified by its user agent
pub(crate) fn interactive_ctx(user_agent: &str) -> SessionContext {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, user_agent.parse().unwrap());
    SessionContext::from_headers(&headers)
}

/// In-memory store that counts what the handler asks of it
#[derive(Default)]
pub(crate) struct RecordingStore {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    on_start_calls: AtomicUsize,
    gc_calls: Mutex<Vec<u64>>,
}

impl RecordingStore {
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn on_start_calls(&self) -> usize {
        self.on_start_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn gc_calls(&self) -> Vec<u64> {
        self.gc_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn on_start(&self, _config: &SessionConfig) -> Result<(), StorageError> {
        self.on_start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read(&self, session_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(session_id).cloned())
    }

    async fn write(&self, session_id: &str, data: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(session_id.to_string(), data.to_string());
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), StorageError> {
        self.entries.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn id_exists(&self, session_id: &str) -> Result<bool, StorageError> {
        Ok(self.entries.lock().unwrap().contains_key(session_id))
    }

    async fn gc(&self, max_lifetime: u64) -> Result<u64, StorageError> {
        self.gc_calls.lock().unwrap().push(max_lifetime);
        Ok(0)
    }
}

/// Store whose backend is down
pub(crate) struct FailingStore;

fn backend_down() -> StorageError {
    StorageError::Storage("backend down".to_string())
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn on_start(&self, _config: &SessionConfig) -> Result<(), StorageError> {
        Err(backend_down())
    }

    async fn read(&self, _session_id: &str) -> Result<Option<String>, StorageError> {
        Err(backend_down())
    }

    async fn write(&self, _session_id: &str, _data: &str) -> Result<(), StorageError> {
        Err(backend_down())
    }

    async fn destroy(&self, _session_id: &str) -> Result<(), StorageError> {
        Err(backend_down())
    }

    async fn id_exists(&self, _session_id: &str) -> Result<bool, StorageError> {
        Err(backend_down())
    }

    async fn gc(&self, _max_lifetime: u64) -> Result<u64, StorageError> {
        Err(backend_down())
    }
}

/// Store that reports every id as taken
#[derive(Default)]
pub(crate) struct TakenStore {
    id_exists_calls: AtomicUsize,
}

impl TakenStore {
    pub(crate) fn id_exists_calls(&self) -> usize {
        self.id_exists_calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn always_taken_store() -> Arc<TakenStore> {
    Arc::new(TakenStore::default())
}

#[async_trait]
impl SessionStore for TakenStore {
    async fn read(&self, _session_id: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn write(&self, _session_id: &str, _data: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn destroy(&self, _session_id: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn id_exists(&self, _session_id: &str) -> Result<bool, StorageError> {
        self.id_exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}
