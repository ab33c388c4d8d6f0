//! The shared query cache.
//!
//! One entry per key holds the latest [`QueryState`] behind a watch channel,
//! so any number of observers share it. Fetches run as tokio tasks; each
//! entry carries a generation counter and a fetch only lands if its
//! generation is still current when it completes. Every batch of writes
//! publishes exactly one cache revision.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use laulud_core::{LauludError, LauludResult};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::config::CacheConfig;
use crate::freshness::Freshness;
use crate::observer::{QueryObserver, QueryOptions};
use crate::state::{QueryState, QueryStatus};
use crate::traits::{CacheStats, QueryFetcher, QueryKey, QueryValue};

struct Entry<V> {
    state: watch::Sender<QueryState<V>>,
    /// Bumped when a fetch starts or a write supersedes one.
    generation: u64,
    /// Bumped on every data write.
    version: u64,
    task: Option<JoinHandle<()>>,
    fetched_at: Option<Instant>,
    observers: usize,
    unobserved_since: Option<Instant>,
}

impl<V: QueryValue> Entry<V> {
    fn new() -> Self {
        let (state, _) = watch::channel(QueryState::idle());
        Self {
            state,
            generation: 0,
            version: 0,
            task: None,
            fetched_at: None,
            observers: 0,
            unobserved_since: Some(Instant::now()),
        }
    }

    fn snapshot(&self) -> QueryState<V> {
        self.state.borrow().clone()
    }

    fn is_fetching(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Abort the in-flight fetch, if any, and invalidate its generation.
    /// Returns whether a fetch was running.
    fn supersede(&mut self) -> bool {
        self.generation += 1;
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    fn write(&mut self, data: V) -> u64 {
        self.version += 1;
        self.fetched_at = Some(Instant::now());
        let is_fetching = self.is_fetching();
        self.state.send_modify(|state| {
            state.status = QueryStatus::Success;
            state.data = Some(data);
            state.error = None;
            state.updated_at = Some(Utc::now());
            state.invalidated = false;
            state.is_fetching = is_fetching;
        });
        self.version
    }
}

struct Store<K, V> {
    entries: HashMap<K, Entry<V>>,
    stats: CacheStats,
}

struct Inner<K, V> {
    fetcher: Arc<dyn QueryFetcher<K, V>>,
    config: CacheConfig,
    store: Mutex<Store<K, V>>,
    revision: watch::Sender<u64>,
}

/// Outcome of checking an entry against a freshness requirement.
enum Ensure<V> {
    Fresh(V),
    Started,
    InFlight,
}

/// Fails the entry when a fetch task ends without completing (the fetcher
/// panicked), so callers waiting in [`QueryCache::fetch`] are released and
/// the next observation retries. Aborted fetches were superseded first, so
/// their generation no longer matches and the failure is discarded.
struct FetchGuard<K: QueryKey, V: QueryValue> {
    cache: QueryCache<K, V>,
    key: K,
    generation: u64,
    armed: bool,
}

impl<K: QueryKey, V: QueryValue> Drop for FetchGuard<K, V> {
    fn drop(&mut self) {
        if self.armed {
            debug!(key = ?self.key, generation = self.generation, "Fetch task ended without a result");
            let err = LauludError::Cancelled {
                key: format!("{:?}", self.key),
            };
            self.cache.complete(&self.key, self.generation, Err(err));
        }
    }
}

/// Cheaply clonable handle to a shared query cache.
pub struct QueryCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: QueryKey, V: QueryValue> QueryCache<K, V> {
    pub fn new(fetcher: Arc<dyn QueryFetcher<K, V>>, config: CacheConfig) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                fetcher,
                config,
                store: Mutex::new(Store {
                    entries: HashMap::new(),
                    stats: CacheStats::default(),
                }),
                revision,
            }),
        }
    }

    /// Create a new cache with default configuration.
    pub fn with_defaults(fetcher: Arc<dyn QueryFetcher<K, V>>) -> Self {
        Self::new(fetcher, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, Store<K, V>> {
        // State stays consistent across a panic in a short critical section.
        self.inner
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    /// Current cache revision.
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Receiver notified once per batch of cache writes.
    pub fn subscribe_revisions(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Bind an observer to `key`.
    pub fn observe(&self, key: K, options: QueryOptions) -> QueryObserver<K, V> {
        QueryObserver::new(self.clone(), key, options)
    }

    // ------------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------------

    fn ensure(
        &self,
        key: &K,
        entry: &mut Entry<V>,
        stats: &mut CacheStats,
        freshness: &Freshness,
    ) -> Ensure<V> {
        if entry.is_fetching() {
            stats.deduplicated += 1;
            trace!(?key, "Joined in-flight fetch");
            return Ensure::InFlight;
        }
        let (data, invalidated) = {
            let state = entry.state.borrow();
            (state.data.clone(), state.invalidated)
        };
        let Some(data) = data else {
            stats.misses += 1;
            self.start_fetch(key, entry, stats);
            return Ensure::Started;
        };
        stats.hits += 1;
        let fresh = !invalidated
            && entry
                .fetched_at
                .is_some_and(|at| freshness.accepts_age(at.elapsed()));
        if fresh {
            Ensure::Fresh(data)
        } else {
            self.start_fetch(key, entry, stats);
            Ensure::Started
        }
    }

    fn start_fetch(&self, key: &K, entry: &mut Entry<V>, stats: &mut CacheStats) {
        if entry.supersede() {
            stats.superseded += 1;
            debug!(?key, "Superseded in-flight fetch");
        }
        let generation = entry.generation;
        stats.fetches += 1;
        entry.state.send_modify(|state| {
            state.is_fetching = true;
            if state.data.is_none() {
                state.status = QueryStatus::Loading;
                state.error = None;
            }
        });
        debug!(?key, generation, "Fetch started");

        let cache = self.clone();
        let fetcher = Arc::clone(&self.inner.fetcher);
        let key = key.clone();
        entry.task = Some(tokio::spawn(async move {
            let mut guard = FetchGuard {
                cache: cache.clone(),
                key: key.clone(),
                generation,
                armed: true,
            };
            let result = fetcher.fetch(&key).await;
            guard.armed = false;
            cache.complete(&key, generation, result);
        }));
    }

    fn complete(&self, key: &K, generation: u64, result: LauludResult<V>) {
        {
            let mut store = self.lock();
            let Some(entry) = store.entries.get_mut(key) else {
                debug!(?key, "Discarded response for evicted entry");
                return;
            };
            if entry.generation != generation {
                debug!(?key, generation, "Discarded superseded response");
                return;
            }
            entry.task = None;
            match result {
                Ok(data) => {
                    entry.write(data);
                    debug!(?key, "Fetch succeeded");
                }
                Err(err) => {
                    if err.is_fatal() {
                        error!(?key, error = %err, "Fetch returned data the client cannot represent");
                    } else {
                        warn!(?key, error = %err, "Fetch failed");
                    }
                    entry.state.send_modify(|state| {
                        state.status = QueryStatus::Error;
                        state.error = Some(err);
                        state.is_fetching = false;
                    });
                }
            }
        }
        self.publish();
    }

    /// Resolve `key`, sharing any request already in flight.
    ///
    /// Data that satisfies the configured freshness is returned without a
    /// request.
    pub async fn fetch(&self, key: K) -> LauludResult<V> {
        let (mut rx, started) = {
            let mut store = self.lock();
            let Store { entries, stats } = &mut *store;
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            let started = match self.ensure(&key, entry, stats, &self.inner.config.freshness) {
                Ensure::Fresh(data) => return Ok(data),
                Ensure::Started => true,
                Ensure::InFlight => false,
            };
            (entry.state.subscribe(), started)
        };
        if started {
            self.publish();
        }

        let cancelled = || LauludError::Cancelled {
            key: format!("{:?}", key),
        };
        let state = match rx.wait_for(|state| !state.is_fetching).await {
            Ok(state) => state.clone(),
            Err(_) => return Err(cancelled()),
        };
        match state {
            QueryState {
                status: QueryStatus::Error,
                error: Some(err),
                ..
            } => Err(err),
            QueryState {
                data: Some(data), ..
            } => Ok(data),
            _ => Err(cancelled()),
        }
    }

    /// Force a new request for `key`, superseding any in flight.
    pub fn refetch(&self, key: &K) {
        {
            let mut store = self.lock();
            let Store { entries, stats } = &mut *store;
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            self.start_fetch(key, entry, stats);
        }
        self.publish();
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    pub(crate) fn attach(
        &self,
        key: &K,
        freshness: Option<&Freshness>,
    ) -> watch::Receiver<QueryState<V>> {
        let freshness = freshness.unwrap_or(&self.inner.config.freshness);
        let (rx, started) = {
            let mut store = self.lock();
            let Store { entries, stats } = &mut *store;
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.observers += 1;
            entry.unobserved_since = None;
            let started = matches!(self.ensure(key, entry, stats, freshness), Ensure::Started);
            (entry.state.subscribe(), started)
        };
        if started {
            self.publish();
        }
        rx
    }

    pub(crate) fn release(&self, key: &K) {
        let mut store = self.lock();
        if let Some(entry) = store.entries.get_mut(key) {
            entry.observers = entry.observers.saturating_sub(1);
            if entry.observers == 0 {
                entry.unobserved_since = Some(Instant::now());
                trace!(?key, "Last observer released");
            }
        }
    }

    pub fn observer_count(&self, key: &K) -> usize {
        self.lock().entries.get(key).map_or(0, |entry| entry.observers)
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Apply several writes under one lock and publish a single revision.
    pub fn batch<R>(&self, f: impl FnOnce(&mut CacheBatch<'_, K, V>) -> R) -> R {
        let (result, changed) = {
            let mut store = self.lock();
            let mut batch = CacheBatch {
                cache: self,
                store: &mut *store,
                changed: false,
            };
            let result = f(&mut batch);
            (result, batch.changed)
        };
        if changed {
            self.publish();
        }
        result
    }

    /// Write `value` directly, superseding any in-flight fetch.
    pub fn set_data(&self, key: K, value: V) {
        self.batch(|batch| {
            batch.set_data(key, value);
        })
    }

    /// Replace existing data with `f(data)`. Returns false when there is no
    /// data or `f` declines.
    pub fn update_data(&self, key: &K, f: impl FnOnce(&V) -> Option<V>) -> bool {
        self.batch(|batch| batch.update_data(key, f))
    }

    /// Mark `key` stale. Observed keys refetch immediately.
    pub fn invalidate(&self, key: &K) -> bool {
        self.batch(|batch| batch.invalidate(key))
    }

    /// Invalidate every key matching `pred`.
    pub fn invalidate_where(&self, pred: impl Fn(&K) -> bool) -> usize {
        self.batch(|batch| batch.invalidate_where(pred))
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Current state of `key`; idle if absent.
    pub fn snapshot(&self, key: &K) -> QueryState<V> {
        self.lock()
            .entries
            .get(key)
            .map_or_else(QueryState::idle, Entry::snapshot)
    }

    /// States of several keys taken under one lock.
    pub fn snapshots<'k>(&self, keys: impl IntoIterator<Item = &'k K>) -> Vec<QueryState<V>> {
        let store = self.lock();
        keys.into_iter()
            .map(|key| {
                store
                    .entries
                    .get(key)
                    .map_or_else(QueryState::idle, Entry::snapshot)
            })
            .collect()
    }

    pub fn data(&self, key: &K) -> Option<V> {
        self.lock()
            .entries
            .get(key)
            .and_then(|entry| entry.state.borrow().data.clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<K> {
        self.lock().entries.keys().cloned().collect()
    }

    pub fn stats(&self) -> CacheStats {
        let store = self.lock();
        CacheStats {
            entry_count: store.entries.len() as u64,
            ..store.stats.clone()
        }
    }

    // ------------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------------

    /// Evict entries that have had no observers for at least `gc_time`.
    pub fn collect_garbage(&self) -> usize {
        let gc_time = self.inner.config.gc_time;
        let now = Instant::now();
        let mut store = self.lock();
        let before = store.entries.len();
        store.entries.retain(|key, entry| {
            let expired = entry.observers == 0
                && !entry.is_fetching()
                && entry
                    .unobserved_since
                    .is_some_and(|since| now.duration_since(since) >= gc_time);
            if expired {
                trace!(?key, "Evicting unobserved entry");
            }
            !expired
        });
        let evicted = before - store.entries.len();
        store.stats.evictions += evicted as u64;
        if evicted > 0 {
            debug!(evicted, "Garbage collected cache entries");
        }
        evicted
    }

    /// Abort all fetches, drop unobserved entries and reset observed ones to
    /// idle.
    pub fn clear(&self) {
        {
            let mut store = self.lock();
            store.entries.retain(|_, entry| {
                entry.supersede();
                if entry.observers == 0 {
                    return false;
                }
                entry.version += 1;
                entry.fetched_at = None;
                entry.state.send_replace(QueryState::idle());
                true
            });
        }
        info!("Query cache cleared");
        self.publish();
    }
}

/// Writes applied under the cache lock by [`QueryCache::batch`].
pub struct CacheBatch<'a, K, V> {
    cache: &'a QueryCache<K, V>,
    store: &'a mut Store<K, V>,
    changed: bool,
}

impl<'a, K: QueryKey, V: QueryValue> CacheBatch<'a, K, V> {
    pub fn state(&self, key: &K) -> Option<QueryState<V>> {
        self.store.entries.get(key).map(Entry::snapshot)
    }

    pub fn data(&self, key: &K) -> Option<V> {
        self.store
            .entries
            .get(key)
            .and_then(|entry| entry.state.borrow().data.clone())
    }

    /// Write version of `key`, bumped on every data write.
    pub fn version(&self, key: &K) -> Option<u64> {
        self.store.entries.get(key).map(|entry| entry.version)
    }

    /// Write `value`, superseding any in-flight fetch. Returns the new write
    /// version.
    pub fn set_data(&mut self, key: K, value: V) -> u64 {
        let Store { entries, stats } = &mut *self.store;
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        if entry.supersede() {
            stats.superseded += 1;
            debug!(?key, "Direct write superseded in-flight fetch");
        }
        self.changed = true;
        entry.write(value)
    }

    pub fn update_data(&mut self, key: &K, f: impl FnOnce(&V) -> Option<V>) -> bool {
        let Some(next) = self.data(key).and_then(|current| f(&current)) else {
            return false;
        };
        self.set_data(key.clone(), next);
        true
    }

    pub fn invalidate(&mut self, key: &K) -> bool {
        let Store { entries, stats } = &mut *self.store;
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        entry.state.send_modify(|state| state.invalidated = true);
        if entry.observers > 0 {
            self.cache.start_fetch(key, entry, stats);
        }
        trace!(?key, observed = entry.observers > 0, "Invalidated");
        self.changed = true;
        true
    }

    pub fn invalidate_where(&mut self, pred: impl Fn(&K) -> bool) -> usize {
        let keys: Vec<K> = self
            .store
            .entries
            .keys()
            .filter(|key| pred(key))
            .cloned()
            .collect();
        keys.iter().filter(|key| self.invalidate(key)).count()
    }

    /// Put `snapshot` back if nothing has written to `key` since `version`.
    pub fn restore(&mut self, key: &K, version: u64, snapshot: QueryState<V>) -> bool {
        let Some(entry) = self.store.entries.get_mut(key) else {
            return false;
        };
        if entry.version != version {
            debug!(?key, "Kept newer write instead of restoring snapshot");
            return false;
        }
        entry.version += 1;
        let is_fetching = entry.is_fetching();
        entry.state.send_replace(QueryState {
            is_fetching,
            ..snapshot
        });
        self.changed = true;
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================
