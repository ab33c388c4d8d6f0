//! Declarative binding from a consumer to one cache key.

use tokio::sync::watch;

use crate::freshness::Freshness;
use crate::state::QueryState;
use crate::store::QueryCache;
use crate::traits::{QueryKey, QueryValue};

/// Options for a [`QueryObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// A disabled observer fetches nothing and reports idle.
    pub enabled: bool,
    /// Overrides the cache's default freshness for this observer.
    pub freshness: Option<Freshness>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            freshness: None,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.freshness = Some(freshness);
        self
    }
}

/// A live subscription to one cache entry.
///
/// Observing a key starts a fetch when its data is missing or stale, and
/// concurrent observers of the same key share the entry. Dropping the
/// observer releases the key, after which no response can reach it.
pub struct QueryObserver<K: QueryKey, V: QueryValue> {
    cache: QueryCache<K, V>,
    key: K,
    options: QueryOptions,
    rx: Option<watch::Receiver<QueryState<V>>>,
}

impl<K: QueryKey, V: QueryValue> QueryObserver<K, V> {
    pub(crate) fn new(cache: QueryCache<K, V>, key: K, options: QueryOptions) -> Self {
        let mut observer = Self {
            cache,
            key,
            options,
            rx: None,
        };
        observer.attach();
        observer
    }

    fn attach(&mut self) {
        if self.options.enabled && self.rx.is_none() {
            self.rx = Some(
                self.cache
                    .attach(&self.key, self.options.freshness.as_ref()),
            );
        }
    }

    fn detach(&mut self) {
        if self.rx.take().is_some() {
            self.cache.release(&self.key);
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled
    }

    /// Current state of the bound entry; idle while disabled.
    pub fn state(&self) -> QueryState<V> {
        self.rx
            .as_ref()
            .map_or_else(QueryState::idle, |rx| rx.borrow().clone())
    }

    pub fn data(&self) -> Option<V> {
        self.rx
            .as_ref()
            .and_then(|rx| rx.borrow().data.clone())
    }

    /// Wait for the bound entry to change. Returns false immediately when
    /// disabled, or once the entry is gone.
    pub async fn changed(&mut self) -> bool {
        match self.rx.as_mut() {
            Some(rx) => rx.changed().await.is_ok(),
            None => false,
        }
    }

    /// Rebind to another key. Nothing from the previous key is shown: the
    /// state becomes whatever the new key holds, loading if it holds nothing.
    pub fn set_key(&mut self, key: K) {
        if key == self.key {
            return;
        }
        self.detach();
        self.key = key;
        self.attach();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.options.enabled {
            return;
        }
        self.options.enabled = enabled;
        if enabled {
            self.attach();
        } else {
            self.detach();
        }
    }

    /// Force a new request for the bound key.
    pub fn refetch(&self) {
        if self.rx.is_some() {
            self.cache.refetch(&self.key);
        }
    }
}

impl<K: QueryKey, V: QueryValue> Drop for QueryObserver<K, V> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{cache_with, FnFetcher};
    use crate::state::QueryStatus;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_observer_goes_loading_then_success() {
        let cache = cache_with(FnFetcher::echo(30));
        let mut observer = cache.observe("k".to_string(), QueryOptions::default());
        assert_eq!(observer.state().status, QueryStatus::Loading);
        assert!(observer.state().is_fetching);

        while observer.state().is_fetching {
            assert!(observer.changed().await);
        }
        assert!(observer.state().is_success());
        assert_eq!(observer.data().as_deref(), Some("k#0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observers_share_one_entry() {
        let fetcher = FnFetcher::echo(30);
        let cache = cache_with(fetcher.clone());
        let first = cache.observe("k".to_string(), QueryOptions::default());
        let second = cache.observe("k".to_string(), QueryOptions::default());
        assert_eq!(cache.observer_count(&"k".to_string()), 2);
        sleep(Duration::from_millis(50)).await;

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(first.state(), second.state());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_observer_is_idle_and_fetches_nothing() {
        let fetcher = FnFetcher::echo(10);
        let cache = cache_with(fetcher.clone());
        let mut observer =
            cache.observe(String::new(), QueryOptions::default().enabled(false));
        sleep(Duration::from_millis(50)).await;
        assert!(observer.state().is_idle());
        assert!(!observer.changed().await);
        assert_eq!(fetcher.calls(), 0);

        observer.set_key("q".to_string());
        observer.set_enabled(true);
        sleep(Duration::from_millis(50)).await;
        assert_eq!(observer.data().as_deref(), Some("q#0"));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_key_resets_to_loading() {
        let cache = cache_with(FnFetcher::echo(10));
        let mut observer = cache.observe("a".to_string(), QueryOptions::default());
        sleep(Duration::from_millis(20)).await;
        assert_eq!(observer.data().as_deref(), Some("a#0"));

        observer.set_key("ab".to_string());
        let state = observer.state();
        assert!(state.is_loading());
        assert!(state.data.is_none());
        assert_eq!(cache.observer_count(&"a".to_string()), 0);
        assert_eq!(cache.observer_count(&"ab".to_string()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_for_old_key_never_shown() {
        // "a" answers after 100ms, "ab" after 10ms.
        let fetcher = FnFetcher::new(|key, _| {
            let delay = if key == "a" { 100 } else { 10 };
            (Duration::from_millis(delay), Ok(format!("results for {}", key)))
        });
        let cache = cache_with(fetcher);
        let mut observer = cache.observe("a".to_string(), QueryOptions::default());
        sleep(Duration::from_millis(5)).await;
        observer.set_key("ab".to_string());

        sleep(Duration::from_millis(20)).await;
        assert_eq!(observer.data().as_deref(), Some("results for ab"));
        sleep(Duration::from_millis(200)).await;
        assert_eq!(observer.data().as_deref(), Some("results for ab"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_key() {
        let cache = cache_with(FnFetcher::echo(10));
        let observer = cache.observe("k".to_string(), QueryOptions::default());
        assert_eq!(cache.observer_count(&"k".to_string()), 1);
        drop(observer);
        assert_eq!(cache.observer_count(&"k".to_string()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_keeps_data_while_fetching() {
        let fetcher = FnFetcher::echo(10);
        let cache = cache_with(fetcher.clone());
        let observer = cache.observe("k".to_string(), QueryOptions::default());
        sleep(Duration::from_millis(20)).await;

        observer.refetch();
        let state = observer.state();
        assert!(state.is_fetching);
        assert!(state.is_success());
        assert_eq!(state.data.as_deref(), Some("k#0"));

        sleep(Duration::from_millis(20)).await;
        assert_eq!(observer.data().as_deref(), Some("k#1"));
    }
}
