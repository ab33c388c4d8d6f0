//! Fetcher trait and cache statistics.

use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;
use laulud_core::LauludResult;

/// Marker trait for types usable as cache keys.
pub trait QueryKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> QueryKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Marker trait for types storable as cache values.
pub trait QueryValue: Clone + Debug + Send + Sync + 'static {}

impl<T> QueryValue for T where T: Clone + Debug + Send + Sync + 'static {}

/// Resolves a key against the remote source on cache miss or refetch.
///
/// The cache never retries: a failed fetch is stored as the entry's error.
#[async_trait]
pub trait QueryFetcher<K, V>: Send + Sync {
    async fn fetch(&self, key: &K) -> LauludResult<V>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Observations or reads served from cached data.
    pub hits: u64,
    /// Observations or reads that found no usable data.
    pub misses: u64,
    /// Requests started.
    pub fetches: u64,
    /// Requests avoided because one was already in flight for the key.
    pub deduplicated: u64,
    /// In-flight requests whose result was discarded by a newer write.
    pub superseded: u64,
    /// Entries removed by garbage collection.
    pub evictions: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
