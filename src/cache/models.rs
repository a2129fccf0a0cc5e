//! Cache statistics models.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};

/// Point-in-time view of the response cache counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the store.
    pub hits: u64,
    /// Lookups the store had no entry for.
    pub misses: u64,
    /// Lookups or writes that failed because the store was unreachable or errored.
    pub errors: u64,
    /// `hits + misses`.
    pub total_requests: u64,
    /// Hit rate as a percentage, rounded to two decimals. `0` before any lookup.
    pub hit_rate_percent: f64,
}

impl CacheStats {
    /// Build a snapshot from raw counter values.
    pub fn from_counts(hits: u64, misses: u64, errors: u64) -> Self {
        let total = hits + misses;
        let hit_rate_percent = if total > 0 {
            (hits as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };

        Self {
            hits,
            misses,
            errors,
            total_requests: total,
            hit_rate_percent,
        }
    }

    /// Hit rate as a fraction in `[0, 1]`, `0` when no lookups have happened.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests as f64
        }
    }
}
