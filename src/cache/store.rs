// Key-value store abstraction behind the response cache
// Author: kelexine (https://github.com/kelexine)

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Failures raised by a store. These never leave the cache manager.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unreachable: {0}")]
    Connection(String),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache store error: {0}")]
    Backend(String),
}

/// External key-value store holding cached responses.
///
/// Implementations must be safe for concurrent use; the cache manager shares
/// one instance across every in-flight request.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write a value that expires after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Connectivity probe used by the health check.
    async fn ping(&self) -> Result<(), CacheError>;
}

/// In-process store with per-entry expiry.
///
/// Used when `cache.backend = "memory"`: a single-instance deployment without
/// Redis. Expired entries are dropped lazily when read.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((value, expires_at)) if Instant::now() < *expires_at => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
