use std::sync::Arc;

use alo_session::{
    CacheSessionStore, SessionConfig, SessionStore, SqlSessionStore, StorageError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<dyn SessionStore>,
    pub(crate) config: Arc<SessionConfig>,
}

/// Pick the session backend from its URL.
pub(crate) async fn connect_store(
    url: &str,
    config: &SessionConfig,
) -> Result<Arc<dyn SessionStore>, StorageError> {
    let store: Arc<dyn SessionStore> =
        if url.starts_with("sqlite:") || url.starts_with("postgres") {
            Arc::new(SqlSessionStore::connect(url, config).await?)
        } else {
            Arc::new(CacheSessionStore::connect(url, config).await?)
        };

    tracing::info!("Session store ready: {}", url);
    Ok(store)
}
