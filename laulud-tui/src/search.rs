//! Search view state: debounced query input, result tabs, selection and the
//! optional item details pane.

use std::time::Duration;

use laulud_cache::{Debouncer, QueryObserver, QueryOptions, QueryState};
use laulud_client::LauludCache;
use laulud_core::{ApiData, ApiRoute, ItemKind, SpotifyUri, TaggedItem};
use tokio::sync::watch;

use crate::nav::Route;

/// Which part of the search view receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFocus {
    #[default]
    Results,
    Item,
}

pub struct SearchViewState {
    /// Text as typed, ahead of the debounced query.
    pub input: String,
    debouncer: Debouncer<String>,
    cache: LauludCache,
    results: QueryObserver<ApiRoute, ApiData>,
    item: Option<QueryObserver<ApiRoute, ApiData>>,
    pub tab: ItemKind,
    pub selected: usize,
    pub selected_tag: usize,
    pub focus: SearchFocus,
}

impl SearchViewState {
    /// Nothing is fetched until [`SearchViewState::show`] is called.
    pub fn new(cache: &LauludCache, debounce: Duration) -> Self {
        Self {
            input: String::new(),
            debouncer: Debouncer::new(debounce, String::new()),
            cache: cache.clone(),
            results: cache.observe(
                ApiRoute::ItemSearch(String::new()),
                QueryOptions::new().enabled(false),
            ),
            item: None,
            tab: ItemKind::Track,
            selected: 0,
            selected_tag: 0,
            focus: SearchFocus::Results,
        }
    }

    /// Receiver of debounced query values.
    pub fn subscribe_settled(&self) -> watch::Receiver<String> {
        self.debouncer.subscribe()
    }

    /// Bring the view in line with a search route.
    pub fn show(&mut self, query: Option<&str>, uri: Option<&SpotifyUri>) {
        let query = query.unwrap_or_default().to_string();
        if query != self.query() {
            self.input = query.clone();
            self.debouncer.flush(query.clone());
            self.bind_query(query);
        }
        self.results.set_enabled(!self.query().is_empty());
        self.open(uri.cloned());
    }

    /// Stop observing while another view is on screen.
    pub fn hide(&mut self) {
        self.debouncer.cancel();
        self.results.set_enabled(false);
        if let Some(item) = self.item.as_mut() {
            item.set_enabled(false);
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.push(c);
        self.debouncer.push(self.input.clone());
    }

    pub fn delete_char(&mut self) {
        self.input.pop();
        self.debouncer.push(self.input.clone());
    }

    /// Search for the typed text immediately.
    pub fn submit(&mut self) {
        self.debouncer.flush(self.input.clone());
        self.apply_settled();
    }

    /// Drop pending keystrokes and restore the input to the active query.
    pub fn cancel_input(&mut self) {
        self.debouncer.cancel();
        self.input = self.query().to_string();
    }

    /// Pick up the latest debounced value. Returns true when the query
    /// changed.
    pub fn apply_settled(&mut self) -> bool {
        let settled = self.debouncer.settled();
        if settled == self.query() {
            return false;
        }
        self.bind_query(settled);
        true
    }

    fn bind_query(&mut self, query: String) {
        // Never attach to the empty query, not even in passing.
        let enabled = !query.is_empty();
        if !enabled {
            self.results.set_enabled(false);
        }
        self.results.set_key(ApiRoute::ItemSearch(query));
        self.results.set_enabled(enabled);
        self.selected = 0;
    }

    /// The query the result list is bound to.
    pub fn query(&self) -> &str {
        match self.results.key() {
            ApiRoute::ItemSearch(query) => query,
            _ => "",
        }
    }

    pub fn is_debouncing(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Idle while the query is empty.
    pub fn results_state(&self) -> QueryState<ApiData> {
        self.results.state()
    }

    /// The list key mutations from this view patch.
    pub fn list_key(&self) -> Option<ApiRoute> {
        self.results
            .is_enabled()
            .then(|| self.results.key().clone())
    }

    pub fn visible_items(&self) -> Vec<TaggedItem> {
        self.results
            .data()
            .and_then(|data| data.as_search().map(|results| results.items(self.tab).to_vec()))
            .unwrap_or_default()
    }

    /// Number of results per tab, for the tab labels.
    pub fn tab_counts(&self) -> Vec<(ItemKind, usize)> {
        let data = self.results.data();
        let results = data.as_ref().and_then(|data| data.as_search());
        ItemKind::ALL
            .iter()
            .map(|kind| (*kind, results.map_or(0, |results| results.items(*kind).len())))
            .collect()
    }

    pub fn next_tab(&mut self) {
        let index = ItemKind::ALL.iter().position(|k| *k == self.tab).unwrap_or(0);
        self.tab = ItemKind::ALL[(index + 1) % ItemKind::ALL.len()];
        self.selected = 0;
    }

    pub fn prev_tab(&mut self) {
        let index = ItemKind::ALL.iter().position(|k| *k == self.tab).unwrap_or(0);
        self.tab = ItemKind::ALL[(index + ItemKind::ALL.len() - 1) % ItemKind::ALL.len()];
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        match self.focus {
            SearchFocus::Results => {
                let len = self.visible_items().len();
                if len > 0 {
                    self.selected = (self.selected + 1).min(len - 1);
                }
            }
            SearchFocus::Item => {
                let len = self.item_tags().len();
                if len > 0 {
                    self.selected_tag = (self.selected_tag + 1).min(len - 1);
                }
            }
        }
    }

    pub fn select_previous(&mut self) {
        match self.focus {
            SearchFocus::Results => self.selected = self.selected.saturating_sub(1),
            SearchFocus::Item => self.selected_tag = self.selected_tag.saturating_sub(1),
        }
    }

    pub fn highlighted(&self) -> Option<TaggedItem> {
        self.visible_items().get(self.selected).cloned()
    }

    /// Bind the details pane to `uri`, or close it.
    pub fn open(&mut self, uri: Option<SpotifyUri>) {
        match uri {
            Some(uri) => {
                let key = ApiRoute::Item(uri);
                match self.item.as_mut() {
                    Some(item) if item.key() == &key => item.set_enabled(true),
                    _ => {
                        self.item = Some(self.cache.observe(key, QueryOptions::default()));
                        self.selected_tag = 0;
                    }
                }
                self.focus = SearchFocus::Item;
            }
            None => {
                self.item = None;
                self.focus = SearchFocus::Results;
            }
        }
    }

    pub fn selected_uri(&self) -> Option<&SpotifyUri> {
        match self.item.as_ref().map(|item| item.key()) {
            Some(ApiRoute::Item(uri)) => Some(uri),
            _ => None,
        }
    }

    pub fn item_state(&self) -> QueryState<ApiData> {
        self.item
            .as_ref()
            .map_or_else(QueryState::idle, |item| item.state())
    }

    pub fn item(&self) -> Option<TaggedItem> {
        self.item
            .as_ref()
            .and_then(|item| item.data())
            .and_then(|data| data.as_item().cloned())
    }

    pub fn item_tags(&self) -> Vec<String> {
        self.item().map(|item| item.tags).unwrap_or_default()
    }

    pub fn selected_tag(&self) -> Option<String> {
        self.item_tags().get(self.selected_tag).cloned()
    }

    /// Keep the chip selection in range after the tag set shrinks.
    pub fn clamp_selection(&mut self) {
        let tags = self.item_tags().len();
        self.selected_tag = self.selected_tag.min(tags.saturating_sub(1));
        let items = self.visible_items().len();
        self.selected = self.selected.min(items.saturating_sub(1));
    }

    pub fn refetch(&self) {
        self.results.refetch();
        if let Some(item) = &self.item {
            item.refetch();
        }
    }

    /// Keys this view currently observes, with their state.
    pub fn observed(&self) -> Vec<(ApiRoute, QueryState<ApiData>)> {
        std::iter::once(&self.results)
            .chain(self.item.as_ref())
            .filter(|observer| observer.is_enabled())
            .map(|observer| (observer.key().clone(), observer.state()))
            .collect()
    }

    pub fn route(&self) -> Route {
        let query = self.query();
        Route::Search {
            uri: self.selected_uri().cloned(),
            query: (!query.is_empty()).then(|| query.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laulud_cache::{CacheConfig, QueryStatus};
    use laulud_client::LauludClient;
    use laulud_test_utils::{fixtures, MockTransport};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn setup() -> (LauludClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(Arc::new(fixtures::library())));
        let client = LauludClient::new(transport.clone(), CacheConfig::default());
        (client, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_query_is_idle_and_fetches_nothing() {
        let (client, transport) = setup();
        let mut search = SearchViewState::new(client.cache(), Duration::from_millis(500));
        search.show(None, None);

        assert_eq!(search.results_state().status, QueryStatus::Idle);
        sleep(Duration::from_millis(10)).await;
        assert!(transport.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_is_debounced() {
        let (client, transport) = setup();
        let mut search = SearchViewState::new(client.cache(), Duration::from_millis(500));
        search.show(None, None);

        for c in "myth".chars() {
            search.insert_char(c);
            sleep(Duration::from_millis(100)).await;
            assert!(!search.apply_settled());
        }
        sleep(Duration::from_millis(450)).await;

        assert!(search.apply_settled());
        assert_eq!(search.query(), "myth");
        sleep(Duration::from_millis(10)).await;
        let key = ApiRoute::ItemSearch("myth".to_string());
        assert_eq!(transport.query_count(&key), 1);
        assert_eq!(transport.queries().len(), 1);
        assert!(search.results_state().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_route_mirrors_query_and_item() {
        let (client, _) = setup();
        let mut search = SearchViewState::new(client.cache(), Duration::from_millis(500));
        let uri: SpotifyUri = "spotify:track:123".parse().unwrap();

        search.show(Some("myth"), Some(&uri));

        assert_eq!(search.route().to_string(), "/search/spotify:track:123?q=myth");
        assert_eq!(search.focus, SearchFocus::Item);
        search.open(None);
        assert_eq!(search.route().to_string(), "/search?q=myth");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tabs_filter_results() {
        let (client, _) = setup();
        let mut search = SearchViewState::new(client.cache(), Duration::from_millis(500));
        search.show(Some("m"), None);
        sleep(Duration::from_millis(10)).await;

        let tracks = search.visible_items();
        assert!(tracks.iter().all(|item| item.item.kind() == ItemKind::Track));
        search.next_tab();
        assert_eq!(search.tab, ItemKind::Album);
        search.prev_tab();
        search.prev_tab();
        assert_eq!(search.tab, ItemKind::Artist);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_input_restores_query() {
        let (client, _) = setup();
        let mut search = SearchViewState::new(client.cache(), Duration::from_millis(500));
        search.show(Some("myth"), None);

        search.insert_char('s');
        search.cancel_input();
        sleep(Duration::from_millis(600)).await;

        assert_eq!(search.input, "myth");
        assert!(!search.apply_settled());
    }
}
