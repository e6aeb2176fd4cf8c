mod config;
mod memory;
mod redis;
mod session_store;
mod types;

pub use config::connect_cache_store;
pub use session_store::CacheSessionStore;
pub use types::{CacheStore, InMemoryCacheStore, RedisCacheStore};
