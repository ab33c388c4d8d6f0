//! Tag mutations and cross-cache synchronization.
//!
//! A successful mutation returns the full updated item. That item is written
//! into its single-item entry and patched into the caller's visible list in
//! one cache batch, so every view renders the same tag set within a single
//! revision. Tag summaries are server-computed and are invalidated instead.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use laulud_cache::OptimisticTransaction;
use laulud_core::{
    normalize_tag, ApiData, ApiRoute, LauludError, LauludResult, SpotifyUri, TaggedItem,
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::fetcher::LauludCache;
use crate::transport::ApiTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Add => f.write_str("add"),
            MutationKind::Delete => f.write_str("delete"),
        }
    }
}

/// Status of the most recent mutation call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Loading {
        kind: MutationKind,
    },
    Success {
        kind: MutationKind,
        item: TaggedItem,
    },
    Error {
        kind: MutationKind,
        error: LauludError,
    },
}

impl MutationState {
    pub fn is_loading(&self) -> bool {
        matches!(self, MutationState::Loading { .. })
    }

    pub fn error(&self) -> Option<&LauludError> {
        match self {
            MutationState::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Issues add/delete requests and keeps the cache in step with the results.
#[derive(Clone)]
pub struct TagMutator {
    transport: Arc<dyn ApiTransport>,
    cache: LauludCache,
    status: Arc<watch::Sender<MutationState>>,
    calls: Arc<AtomicU64>,
}

impl TagMutator {
    pub fn new(transport: Arc<dyn ApiTransport>, cache: LauludCache) -> Self {
        let (status, _) = watch::channel(MutationState::Idle);
        Self {
            transport,
            cache,
            status: Arc::new(status),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe_status(&self) -> watch::Receiver<MutationState> {
        self.status.subscribe()
    }

    pub fn status(&self) -> MutationState {
        self.status.borrow().clone()
    }

    /// Back to idle. A call still in flight no longer reports its outcome.
    pub fn reset_status(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.status.send_replace(MutationState::Idle);
    }

    fn begin(&self, kind: MutationKind) -> u64 {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_replace(MutationState::Loading { kind });
        call
    }

    fn finish(
        &self,
        call: u64,
        kind: MutationKind,
        result: LauludResult<TaggedItem>,
    ) -> LauludResult<TaggedItem> {
        if self.calls.load(Ordering::SeqCst) == call {
            let state = match &result {
                Ok(item) => MutationState::Success {
                    kind,
                    item: item.clone(),
                },
                Err(error) => MutationState::Error {
                    kind,
                    error: error.clone(),
                },
            };
            self.status.send_replace(state);
        }
        result
    }

    /// Add `raw_tag` to the item. `list_key` names the list the caller is
    /// showing the item in, which is patched with the result.
    pub async fn add_tag(
        &self,
        uri: &SpotifyUri,
        raw_tag: &str,
        list_key: Option<&ApiRoute>,
    ) -> LauludResult<TaggedItem> {
        let call = self.begin(MutationKind::Add);
        let result = self.run(MutationKind::Add, uri, raw_tag, list_key).await;
        self.finish(call, MutationKind::Add, result)
    }

    pub async fn delete_tag(
        &self,
        uri: &SpotifyUri,
        raw_tag: &str,
        list_key: Option<&ApiRoute>,
    ) -> LauludResult<TaggedItem> {
        let call = self.begin(MutationKind::Delete);
        let result = self.run(MutationKind::Delete, uri, raw_tag, list_key).await;
        self.finish(call, MutationKind::Delete, result)
    }

    /// Delete with the expected result shown immediately. The optimistic
    /// write is rolled back if the server rejects the request.
    pub async fn delete_tag_optimistic(
        &self,
        uri: &SpotifyUri,
        raw_tag: &str,
        list_key: Option<&ApiRoute>,
    ) -> LauludResult<TaggedItem> {
        let call = self.begin(MutationKind::Delete);
        let result = self.run_optimistic_delete(uri, raw_tag, list_key).await;
        self.finish(call, MutationKind::Delete, result)
    }

    async fn run(
        &self,
        kind: MutationKind,
        uri: &SpotifyUri,
        raw_tag: &str,
        list_key: Option<&ApiRoute>,
    ) -> LauludResult<TaggedItem> {
        let tag = normalize_tag(raw_tag)?;
        let result = match kind {
            MutationKind::Add => self.transport.add_tag(uri, &tag).await,
            MutationKind::Delete => self.transport.delete_tag(uri, &tag).await,
        };
        match result {
            Ok(item) => {
                self.sync(&item, &tag, list_key);
                info!(%uri, tag = %tag, %kind, tags = item.tags.len(), "Tag mutation applied");
                Ok(item)
            }
            Err(err) => {
                warn!(%uri, tag = %tag, %kind, error = %err, "Tag mutation failed");
                Err(err)
            }
        }
    }

    async fn run_optimistic_delete(
        &self,
        uri: &SpotifyUri,
        raw_tag: &str,
        list_key: Option<&ApiRoute>,
    ) -> LauludResult<TaggedItem> {
        let tag = normalize_tag(raw_tag)?;
        let mut keys = vec![ApiRoute::Item(uri.clone())];
        keys.extend(list_key.cloned());
        let transaction = OptimisticTransaction::apply(&self.cache, keys, |_, data| {
            data.find_item(uri)
                .map(|current| current.without_tag(&tag))
                .and_then(|expected| data.with_item(&expected))
        });

        match self.transport.delete_tag(uri, &tag).await {
            Ok(item) => {
                self.sync(&item, &tag, list_key);
                transaction.commit();
                info!(%uri, tag = %tag, "Optimistic delete confirmed");
                Ok(item)
            }
            Err(err) => {
                let restored = transaction.rollback();
                warn!(%uri, tag = %tag, restored, error = %err, "Optimistic delete rolled back");
                Err(err)
            }
        }
    }

    /// Write a server-confirmed item everywhere it is shown, in one batch.
    /// `list_key` is patched first; any other cached list holding the item
    /// is patched alongside it.
    pub fn sync(&self, item: &TaggedItem, tag: &str, list_key: Option<&ApiRoute>) {
        let item_key = ApiRoute::Item(item.uri().clone());
        let tag_key = ApiRoute::Tag(tag.to_string());
        let mut holders: Vec<ApiRoute> = list_key.into_iter().cloned().collect();
        holders.extend(
            self.cache
                .keys()
                .into_iter()
                .filter(|key| key.may_contain(item.uri()) && Some(key) != list_key),
        );
        self.cache.batch(|batch| {
            batch.set_data(item_key.clone(), ApiData::Item(item.clone()));
            for key in holders.iter().filter(|key| **key != item_key) {
                batch.update_data(key, |data| data.with_item(item));
            }
            batch.invalidate(&ApiRoute::Tags);
            if list_key != Some(&tag_key) {
                batch.invalidate(&tag_key);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::ApiFetcher;
    use async_trait::async_trait;
    use laulud_cache::CacheConfig;
    use laulud_core::{
        Artist, ExternalUrls, Item, ItemKind, ItemSearchResponse, TagDetails, ValidationError,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<String>>,
        reject: bool,
    }

    fn artist(tags: &[&str]) -> TaggedItem {
        TaggedItem::new(
            Item::Artist(Artist {
                external_urls: ExternalUrls::default(),
                genres: vec![],
                href: String::new(),
                id: "123".to_string(),
                images: vec![],
                name: "Band".to_string(),
                popularity: 0,
                uri: SpotifyUri::new(ItemKind::Artist, "123").unwrap(),
            }),
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[async_trait]
    impl ApiTransport for RecordingTransport {
        async fn query(&self, route: &ApiRoute) -> LauludResult<ApiData> {
            Err(LauludError::NotFound {
                route: route.path(),
            })
        }

        async fn add_tag(&self, _uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
            self.requests.lock().unwrap().push(format!("add {}", tag));
            if self.reject {
                return Err(LauludError::from_status(500, "boom", "/api/items"));
            }
            Ok(artist(&["chill"]).with_tag(tag))
        }

        async fn delete_tag(&self, _uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
            self.requests.lock().unwrap().push(format!("delete {}", tag));
            if self.reject {
                return Err(LauludError::from_status(500, "boom", "/api/items"));
            }
            Ok(artist(&["chill", "driving"]).without_tag(tag))
        }

        async fn auth_check(&self) -> LauludResult<bool> {
            Ok(true)
        }

        async fn logout(&self) -> LauludResult<()> {
            Ok(())
        }

        fn login_url(&self, next: &str) -> String {
            next.to_string()
        }
    }

    fn mutator(transport: RecordingTransport) -> (TagMutator, Arc<RecordingTransport>) {
        let transport = Arc::new(transport);
        let cache = LauludCache::new(
            Arc::new(ApiFetcher::new(transport.clone())),
            CacheConfig::default(),
        );
        (TagMutator::new(transport.clone(), cache), transport)
    }

    fn search_key() -> ApiRoute {
        ApiRoute::ItemSearch("song".to_string())
    }

    fn seed_search(mutator: &TagMutator, item: TaggedItem) {
        mutator.cache.set_data(
            search_key(),
            ApiData::ItemSearch(ItemSearchResponse {
                artists: vec![item],
                ..Default::default()
            }),
        );
    }

    #[tokio::test]
    async fn test_add_tag_updates_item_and_list_in_one_revision() {
        let (mutator, _) = mutator(RecordingTransport::default());
        seed_search(&mutator, artist(&["chill"]));
        let before = mutator.cache.revision();

        let uri = SpotifyUri::new(ItemKind::Artist, "123").unwrap();
        let item = mutator
            .add_tag(&uri, " driving ", Some(&search_key()))
            .await
            .unwrap();

        assert_eq!(item.tags, vec!["chill", "driving"]);
        assert_eq!(mutator.cache.revision(), before + 1);
        let cached = mutator.cache.data(&ApiRoute::Item(uri.clone())).unwrap();
        assert_eq!(cached.as_item().unwrap().tags, item.tags);
        let listed = mutator.cache.data(&search_key()).unwrap();
        assert_eq!(listed.find_item(&uri).unwrap().tags, item.tags);
        assert!(matches!(mutator.status(), MutationState::Success { .. }));
    }

    #[tokio::test]
    async fn test_add_tag_patches_other_cached_lists() {
        let (mutator, _) = mutator(RecordingTransport::default());
        seed_search(&mutator, artist(&["chill"]));
        let other = ApiRoute::ItemSearch("band".to_string());
        mutator.cache.set_data(
            other.clone(),
            ApiData::ItemSearch(ItemSearchResponse {
                artists: vec![artist(&["chill"])],
                ..Default::default()
            }),
        );
        let chill = ApiRoute::Tag("chill".to_string());
        mutator.cache.set_data(
            chill.clone(),
            ApiData::Tag(TagDetails {
                tag: "chill".to_string(),
                items: vec![artist(&["chill"])],
            }),
        );

        let uri = SpotifyUri::new(ItemKind::Artist, "123").unwrap();
        mutator
            .add_tag(&uri, "driving", Some(&search_key()))
            .await
            .unwrap();

        for key in [search_key(), other, chill] {
            let data = mutator.cache.data(&key).unwrap();
            assert_eq!(data.find_item(&uri).unwrap().tags, vec!["chill", "driving"]);
        }
    }

    #[tokio::test]
    async fn test_empty_tag_is_rejected_without_request() {
        let (mutator, transport) = mutator(RecordingTransport::default());
        let uri = SpotifyUri::new(ItemKind::Artist, "123").unwrap();

        let err = mutator.add_tag(&uri, "   ", None).await.unwrap_err();

        assert_eq!(err, LauludError::Validation(ValidationError::EmptyTag));
        assert!(transport.requests.lock().unwrap().is_empty());
        assert_eq!(mutator.status().error(), Some(&err));
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_untouched() {
        let (mutator, _) = mutator(RecordingTransport {
            reject: true,
            ..Default::default()
        });
        seed_search(&mutator, artist(&["chill"]));
        let before = mutator.cache.revision();
        let uri = SpotifyUri::new(ItemKind::Artist, "123").unwrap();

        assert!(mutator
            .add_tag(&uri, "driving", Some(&search_key()))
            .await
            .is_err());

        assert_eq!(mutator.cache.revision(), before);
        assert!(!mutator.cache.contains(&ApiRoute::Item(uri)));
    }

    #[tokio::test]
    async fn test_optimistic_delete_rolls_back_on_failure() {
        let (mutator, _) = mutator(RecordingTransport {
            reject: true,
            ..Default::default()
        });
        seed_search(&mutator, artist(&["chill", "driving"]));
        let uri = SpotifyUri::new(ItemKind::Artist, "123").unwrap();

        assert!(mutator
            .delete_tag_optimistic(&uri, "driving", Some(&search_key()))
            .await
            .is_err());

        let listed = mutator.cache.data(&search_key()).unwrap();
        assert_eq!(listed.find_item(&uri).unwrap().tags, vec!["chill", "driving"]);
    }

    #[tokio::test]
    async fn test_reset_status_hides_outcome() {
        let (mutator, _) = mutator(RecordingTransport::default());
        let uri = SpotifyUri::new(ItemKind::Artist, "123").unwrap();
        mutator.add_tag(&uri, "driving", None).await.unwrap();

        mutator.reset_status();

        assert_eq!(mutator.status(), MutationState::Idle);
    }
}
