// Cache manager - keys, bounded lookups and stores, hit/miss/error counters
// Author: kelexine (https://github.com/kelexine)

use super::key::compute_key;
use super::models::CacheStats;
use super::store::{CacheError, KeyValueStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Fail-open response cache in front of a [`KeyValueStore`].
///
/// Store failures are counted and logged, never returned: a failed lookup is
/// reported as a miss to the caller and a failed write as `false`.
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    timeout: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            store,
            ttl,
            timeout,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Look up the cached response for a prompt.
    ///
    /// Returns `None` on a miss and on any store failure.
    pub async fn lookup(&self, prompt: &str) -> Option<String> {
        let key = compute_key(prompt);

        match self.bounded(self.store.get(&key)).await {
            // An empty cached string counts as a miss
            Ok(Some(cached)) if !cached.is_empty() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_cache_hit();
                debug!("Cache hit: {}...", &key[..24]);
                Some(cached)
            }
            Ok(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_cache_miss();
                debug!("Cache miss: {}...", &key[..24]);
                None
            }
            Err(e) => {
                self.record_error();
                error!("Cache read error: {}", e);
                None
            }
        }
    }

    /// Store a response for a prompt with the configured TTL.
    ///
    /// Best-effort: returns `false` instead of failing.
    pub async fn store(&self, prompt: &str, response: &str) -> bool {
        let key = compute_key(prompt);

        match self.bounded(self.store.set_ex(&key, response, self.ttl)).await {
            Ok(()) => {
                debug!(
                    "Cached response: {}... (TTL: {}s)",
                    &key[..24],
                    self.ttl.as_secs()
                );
                true
            }
            Err(e) => {
                self.record_error();
                error!("Cache write error: {}", e);
                false
            }
        }
    }

    /// Probe store connectivity. Does not touch the counters.
    pub async fn ping(&self) -> Result<(), CacheError> {
        self.bounded(self.store.ping()).await
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats::from_counts(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
        )
    }

    /// Configured time-to-live for new entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        crate::metrics::record_cache_error();
    }

    async fn bounded<T>(
        &self,
        op: impl std::future::Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.timeout, op)
            .await
            .unwrap_or(Err(CacheError::Timeout(self.timeout)))
    }
}
