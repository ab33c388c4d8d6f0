//! Optimistic updates with rollback.
//!
//! A transaction writes the expected result of a mutation into the cache
//! before the server answers, remembering what each key held. It ends either
//! committed (the optimistic data stays until the real result overwrites it)
//! or rolled back (snapshots restored). Rollback skips any key written again
//! after the optimistic apply, so it never clobbers newer data.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::QueryState;
use crate::store::QueryCache;
use crate::traits::{QueryKey, QueryValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Pending,
    Committed,
    RolledBack,
}

struct Applied<K, V> {
    key: K,
    previous: QueryState<V>,
    version: u64,
}

/// A pending optimistic write across one or more keys.
///
/// Dropping a pending transaction rolls it back.
pub struct OptimisticTransaction<K: QueryKey, V: QueryValue> {
    id: Uuid,
    cache: QueryCache<K, V>,
    applied: Vec<Applied<K, V>>,
    state: TransactionState,
}

impl<K: QueryKey, V: QueryValue> OptimisticTransaction<K, V> {
    /// Replace the data of each key with `f(key, data)` in a single batch.
    /// Keys without data, or for which `f` returns `None`, are left alone.
    pub fn apply(
        cache: &QueryCache<K, V>,
        keys: impl IntoIterator<Item = K>,
        f: impl Fn(&K, &V) -> Option<V>,
    ) -> Self {
        let id = Uuid::now_v7();
        let applied = cache.batch(|batch| {
            let mut applied: Vec<Applied<K, V>> = Vec::new();
            for key in keys {
                if applied.iter().any(|a| a.key == key) {
                    continue;
                }
                let Some(previous) = batch.state(&key) else {
                    continue;
                };
                let Some(next) = previous.data.as_ref().and_then(|data| f(&key, data)) else {
                    continue;
                };
                let version = batch.set_data(key.clone(), next);
                applied.push(Applied {
                    key,
                    previous,
                    version,
                });
            }
            applied
        });
        debug!(%id, keys = applied.len(), "Optimistic update applied");
        Self {
            id,
            cache: cache.clone(),
            applied,
            state: TransactionState::Pending,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Keys the transaction wrote.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.applied.iter().map(|applied| &applied.key)
    }

    pub fn commit(mut self) {
        self.state = TransactionState::Committed;
        debug!(id = %self.id, "Optimistic update committed");
    }

    /// Restore every key not written since the apply. Returns how many were
    /// restored.
    pub fn rollback(mut self) -> usize {
        self.rollback_pending()
    }

    fn rollback_pending(&mut self) -> usize {
        if self.state != TransactionState::Pending {
            return 0;
        }
        self.state = TransactionState::RolledBack;
        let applied = std::mem::take(&mut self.applied);
        let restored = self.cache.batch(|batch| {
            let mut restored = 0;
            for Applied {
                key,
                previous,
                version,
            } in applied
            {
                if batch.restore(&key, version, previous) {
                    restored += 1;
                }
            }
            restored
        });
        debug!(id = %self.id, restored, "Optimistic update rolled back");
        restored
    }
}

impl<K: QueryKey, V: QueryValue> Drop for OptimisticTransaction<K, V> {
    fn drop(&mut self) {
        if self.state == TransactionState::Pending {
            warn!(id = %self.id, "Optimistic transaction dropped while pending");
            self.rollback_pending();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{cache_with, FnFetcher};

    fn seeded() -> QueryCache<String, String> {
        let cache = cache_with(FnFetcher::echo(10));
        cache.set_data("item".to_string(), "tags:a,b".to_string());
        cache.set_data("list".to_string(), "list:a,b".to_string());
        cache
    }

    fn strip_b(_: &String, data: &String) -> Option<String> {
        Some(data.replace(",b", ""))
    }

    #[tokio::test]
    async fn test_apply_writes_all_keys_in_one_revision() {
        let cache = seeded();
        let before = cache.revision();
        let tx = OptimisticTransaction::apply(
            &cache,
            ["item".to_string(), "list".to_string(), "missing".to_string()],
            strip_b,
        );
        assert_eq!(cache.revision(), before + 1);
        assert_eq!(tx.keys().count(), 2);
        assert_eq!(cache.data(&"item".to_string()).as_deref(), Some("tags:a"));
        assert_eq!(cache.data(&"list".to_string()).as_deref(), Some("list:a"));
        tx.commit();
        assert_eq!(cache.data(&"item".to_string()).as_deref(), Some("tags:a"));
    }

    #[tokio::test]
    async fn test_rollback_restores_snapshots() {
        let cache = seeded();
        let tx = OptimisticTransaction::apply(
            &cache,
            ["item".to_string(), "list".to_string()],
            strip_b,
        );
        assert_eq!(tx.state(), TransactionState::Pending);
        assert_eq!(tx.rollback(), 2);
        assert_eq!(cache.data(&"item".to_string()).as_deref(), Some("tags:a,b"));
        assert_eq!(cache.data(&"list".to_string()).as_deref(), Some("list:a,b"));
    }

    #[tokio::test]
    async fn test_rollback_keeps_newer_writes() {
        let cache = seeded();
        let tx = OptimisticTransaction::apply(
            &cache,
            ["item".to_string(), "list".to_string()],
            strip_b,
        );
        cache.set_data("item".to_string(), "tags:server".to_string());
        assert_eq!(tx.rollback(), 1);
        assert_eq!(cache.data(&"item".to_string()).as_deref(), Some("tags:server"));
        assert_eq!(cache.data(&"list".to_string()).as_deref(), Some("list:a,b"));
    }

    #[tokio::test]
    async fn test_drop_while_pending_rolls_back() {
        let cache = seeded();
        {
            let _tx = OptimisticTransaction::apply(&cache, ["item".to_string()], strip_b);
            assert_eq!(cache.data(&"item".to_string()).as_deref(), Some("tags:a"));
        }
        assert_eq!(cache.data(&"item".to_string()).as_deref(), Some("tags:a,b"));
    }
}
