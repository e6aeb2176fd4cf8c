use std::sync::Arc;

use alo_session::{
    CacheSessionStore, InMemoryCacheStore, SessionConfig, SessionStore, SqlSessionStore,
};

#[derive(Debug, Clone, Copy)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

pub const ALL_STORES: [StoreKind; 2] = [StoreKind::Sqlite, StoreKind::Memory];

/// Config used by the flows: plain-http cookies, defaults otherwise
pub fn test_config() -> Arc<SessionConfig> {
    Arc::new(SessionConfig::default().with_secure_cookie(false))
}

pub async fn make_store(kind: StoreKind, config: &SessionConfig) -> Arc<dyn SessionStore> {
    match kind {
        StoreKind::Sqlite => Arc::new(
            SqlSessionStore::connect("sqlite::memory:", config)
                .await
                .expect("in-memory sqlite store"),
        ),
        StoreKind::Memory => Arc::new(CacheSessionStore::new(
            Arc::new(InMemoryCacheStore::new()),
            config,
        )),
    }
}
