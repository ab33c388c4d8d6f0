//! Laulud Cache - Client Data Synchronization
//!
//! A keyed query cache that de-duplicates concurrent requests, shares one
//! entry between any number of observers and publishes a revision per batch
//! of writes. Nothing here knows about HTTP: remote resolution goes through
//! the [`QueryFetcher`] trait.
//!
//! # Example
//!
//! ```ignore
//! let cache = QueryCache::new(fetcher, CacheConfig::default());
//! let mut observer = cache.observe(key, QueryOptions::default());
//! while observer.changed().await {
//!     render(observer.state());
//! }
//! ```

pub mod config;
pub mod debounce;
pub mod freshness;
pub mod observer;
pub mod state;
pub mod store;
pub mod traits;
pub mod transaction;

pub use config::CacheConfig;
pub use debounce::{schedule, Debouncer, TimerHandle};
pub use freshness::Freshness;
pub use observer::{QueryObserver, QueryOptions};
pub use state::{QueryState, QueryStatus};
pub use store::{CacheBatch, QueryCache};
pub use traits::{CacheStats, QueryFetcher, QueryKey, QueryValue};
pub use transaction::{OptimisticTransaction, TransactionState};
