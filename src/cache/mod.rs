// Response cache module
// Author: kelexine (https://github.com/kelexine)

pub mod key;
pub mod manager;
pub mod models;
mod redis_store;
pub mod store;

pub use key::{compute_key, CACHE_KEY_PREFIX};
pub use manager::CacheManager;
pub use models::CacheStats;
pub use redis_store::RedisStore;
pub use store::{CacheError, KeyValueStore, MemoryStore};

use crate::config::{CacheBackend, CacheConfig};
use std::sync::Arc;
use std::time::Duration;

/// Build the store selected by `cache.backend`. Does not connect.
pub fn build_store(config: &CacheConfig) -> Result<Arc<dyn KeyValueStore>, CacheError> {
    match config.backend {
        CacheBackend::Redis => {
            let timeout = Duration::from_secs(config.operation_timeout_seconds);
            let store = RedisStore::new(&config.connection_url(), timeout)?;
            tracing::info!("Response cache backed by Redis at {}", store.endpoint());
            Ok(Arc::new(store))
        }
        CacheBackend::Memory => {
            tracing::info!("Response cache backed by in-process memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Build a cache manager from configuration.
pub fn build_manager(config: &CacheConfig) -> Result<CacheManager, CacheError> {
    Ok(CacheManager::new(
        build_store(config)?,
        Duration::from_secs(config.ttl_seconds),
        Duration::from_secs(config.operation_timeout_seconds),
    ))
}
