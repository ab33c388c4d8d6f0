//! Laulud Test Utilities
//!
//! Shared test infrastructure for the Laulud workspace:
//! - Proptest generators for URIs, tags and items
//! - Catalog fixtures
//! - An in-memory tag backend with the server's set semantics
//! - A mock transport with per-route delays and failure injection
//! - A fake REST API served by axum on a loopback port
//! - Custom assertions

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

pub use laulud_client::{ApiTransport, SESSION_COOKIE_NAME};
pub use laulud_core::{
    AlbumSimplified, ApiData, ApiRoute, Artist, ArtistSimplified, CurrentUser, ExternalUrls,
    Image, Item, ItemKind, ItemSearchResponse, LauludError, LauludResult, SpotifyUri, TagDetails,
    TagSummary, TaggedItem, Track,
};

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

#[derive(Default)]
struct Library {
    catalog: Vec<Item>,
    tags: HashMap<SpotifyUri, Vec<String>>,
}

impl Library {
    fn find(&self, uri: &SpotifyUri) -> Option<&Item> {
        self.catalog.iter().find(|item| item.uri() == uri)
    }

    fn tagged(&self, item: &Item) -> TaggedItem {
        let tags = self.tags.get(item.uri()).cloned().unwrap_or_default();
        TaggedItem::new(item.clone(), tags)
    }
}

/// Catalog plus tag documents, behaving like the real server: adding a tag
/// is a set insert, deleting one is a set removal, and an item without a tag
/// document has no tags.
#[derive(Default)]
pub struct MockBackend {
    library: Mutex<Library>,
    user: Mutex<Option<CurrentUser>>,
    authenticated: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            authenticated: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// Add a catalog item with its initial tags.
    pub fn with_item(self, item: TaggedItem) -> Self {
        self.insert(item);
        self
    }

    pub fn with_user(self, user: CurrentUser) -> Self {
        *self.user.lock().unwrap() = Some(user);
        self
    }

    pub fn insert(&self, item: TaggedItem) {
        let mut library = self.library.lock().unwrap();
        let uri = item.uri().clone();
        library.catalog.retain(|existing| existing.uri() != &uri);
        library.catalog.push(item.item);
        if item.tags.is_empty() {
            library.tags.remove(&uri);
        } else {
            library.tags.insert(uri, item.tags);
        }
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub fn item(&self, uri: &SpotifyUri) -> Option<TaggedItem> {
        let library = self.library.lock().unwrap();
        library.find(uri).map(|item| library.tagged(item))
    }

    pub fn add_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
        let mut library = self.library.lock().unwrap();
        let item = library.find(uri).cloned().ok_or_else(|| not_found(uri))?;
        let tags = library.tags.entry(uri.clone()).or_default();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
        Ok(library.tagged(&item))
    }

    pub fn delete_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
        let mut library = self.library.lock().unwrap();
        let item = library.find(uri).cloned().ok_or_else(|| not_found(uri))?;
        if let Some(tags) = library.tags.get_mut(uri) {
            tags.retain(|t| t != tag);
        }
        Ok(library.tagged(&item))
    }

    /// Case-insensitive name match, grouped by kind.
    pub fn search(&self, query: &str) -> ItemSearchResponse {
        let library = self.library.lock().unwrap();
        let needle = query.to_lowercase();
        let mut response = ItemSearchResponse::default();
        for item in library
            .catalog
            .iter()
            .filter(|item| item.name().to_lowercase().contains(&needle))
        {
            let tagged = library.tagged(item);
            match item.kind() {
                ItemKind::Track => response.tracks.push(tagged),
                ItemKind::Album => response.albums.push(tagged),
                ItemKind::Artist => response.artists.push(tagged),
            }
        }
        response
    }

    /// Tags by item count, most used first.
    pub fn tag_summaries(&self) -> Vec<TagSummary> {
        let library = self.library.lock().unwrap();
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for tags in library.tags.values() {
            for tag in tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }
        let mut summaries: Vec<TagSummary> = counts
            .into_iter()
            .map(|(tag, num_items)| TagSummary {
                tag: tag.to_string(),
                num_items,
            })
            .collect();
        summaries.sort_by(|a, b| b.num_items.cmp(&a.num_items).then_with(|| a.tag.cmp(&b.tag)));
        summaries
    }

    pub fn tag_details(&self, tag: &str) -> TagDetails {
        let library = self.library.lock().unwrap();
        let items = library
            .catalog
            .iter()
            .map(|item| library.tagged(item))
            .filter(|item| item.has_tag(tag))
            .collect();
        TagDetails {
            tag: tag.to_string(),
            items,
        }
    }

    pub fn current_user(&self) -> CurrentUser {
        self.user
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(fixtures::current_user)
    }

    pub fn query(&self, route: &ApiRoute) -> LauludResult<ApiData> {
        let data = match route {
            ApiRoute::CurrentUser => ApiData::CurrentUser(self.current_user()),
            ApiRoute::Item(uri) => ApiData::Item(self.item(uri).ok_or_else(|| not_found(uri))?),
            ApiRoute::ItemSearch(query) => ApiData::ItemSearch(self.search(query)),
            ApiRoute::Tags => ApiData::Tags(self.tag_summaries()),
            ApiRoute::Tag(tag) => ApiData::Tag(self.tag_details(tag)),
        };
        Ok(data)
    }
}

fn not_found(uri: &SpotifyUri) -> LauludError {
    LauludError::NotFound {
        route: ApiRoute::Item(uri.clone()).path(),
    }
}

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

/// A recorded mutation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationCall {
    Add { uri: SpotifyUri, tag: String },
    Delete { uri: SpotifyUri, tag: String },
}

/// [`ApiTransport`] over a [`MockBackend`].
///
/// Every query is recorded. Delays use tokio time, so tests on a paused
/// clock control exactly when responses arrive.
pub struct MockTransport {
    backend: Arc<MockBackend>,
    delays: Mutex<HashMap<ApiRoute, Duration>>,
    failures: Mutex<HashMap<ApiRoute, LauludError>>,
    mutation_failure: Mutex<Option<LauludError>>,
    mutation_delay: Mutex<Duration>,
    queries: Mutex<Vec<ApiRoute>>,
    mutations: Mutex<Vec<MutationCall>>,
    logouts: Mutex<usize>,
}

impl MockTransport {
    pub fn new(backend: Arc<MockBackend>) -> Self {
        Self {
            backend,
            delays: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            mutation_failure: Mutex::new(None),
            mutation_delay: Mutex::new(Duration::ZERO),
            queries: Mutex::new(Vec::new()),
            mutations: Mutex::new(Vec::new()),
            logouts: Mutex::new(0),
        }
    }

    pub fn backend(&self) -> &Arc<MockBackend> {
        &self.backend
    }

    pub fn set_delay(&self, route: ApiRoute, delay: Duration) {
        self.delays.lock().unwrap().insert(route, delay);
    }

    pub fn set_mutation_delay(&self, delay: Duration) {
        *self.mutation_delay.lock().unwrap() = delay;
    }

    /// Fail every query for `route` until cleared.
    pub fn fail_route(&self, route: ApiRoute, error: LauludError) {
        self.failures.lock().unwrap().insert(route, error);
    }

    pub fn fail_mutations(&self, error: LauludError) {
        *self.mutation_failure.lock().unwrap() = Some(error);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
        *self.mutation_failure.lock().unwrap() = None;
    }

    pub fn queries(&self) -> Vec<ApiRoute> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self, route: &ApiRoute) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|r| *r == route)
            .count()
    }

    pub fn mutations(&self) -> Vec<MutationCall> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn logout_count(&self) -> usize {
        *self.logouts.lock().unwrap()
    }

    async fn mutate(
        &self,
        call: MutationCall,
        apply: impl FnOnce(&MockBackend) -> LauludResult<TaggedItem>,
    ) -> LauludResult<TaggedItem> {
        self.mutations.lock().unwrap().push(call);
        let delay = *self.mutation_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.mutation_failure.lock().unwrap().clone() {
            return Err(error);
        }
        apply(&self.backend)
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn query(&self, route: &ApiRoute) -> LauludResult<ApiData> {
        self.queries.lock().unwrap().push(route.clone());
        let delay = self.delays.lock().unwrap().get(route).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failures.lock().unwrap().get(route).cloned() {
            return Err(error);
        }
        if !self.backend.is_authenticated() {
            return Err(LauludError::Unauthenticated);
        }
        self.backend.query(route)
    }

    async fn add_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
        let call = MutationCall::Add {
            uri: uri.clone(),
            tag: tag.to_string(),
        };
        self.mutate(call, |backend| backend.add_tag(uri, tag)).await
    }

    async fn delete_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
        let call = MutationCall::Delete {
            uri: uri.clone(),
            tag: tag.to_string(),
        };
        self.mutate(call, |backend| backend.delete_tag(uri, tag)).await
    }

    async fn auth_check(&self) -> LauludResult<bool> {
        Ok(self.backend.is_authenticated())
    }

    async fn logout(&self) -> LauludResult<()> {
        *self.logouts.lock().unwrap() += 1;
        self.backend.set_authenticated(false);
        Ok(())
    }

    fn login_url(&self, next: &str) -> String {
        format!("http://mock/api/oauth/redirect?next={}", next)
    }
}

// ============================================================================
// FAKE HTTP API
// ============================================================================

pub mod server {
    //! The REST API served from a [`MockBackend`] on a loopback port.

    use super::*;
    use axum::extract::{Path, State};
    use axum::http::header::COOKIE;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use laulud_core::CreateTagBody;
    use tokio::task::JoinHandle;

    #[derive(Clone)]
    struct AppState {
        backend: Arc<MockBackend>,
        session_cookie: Option<String>,
    }

    /// A running server. Dropping it shuts the server down.
    pub struct FakeApi {
        pub base_url: String,
        task: JoinHandle<()>,
    }

    impl Drop for FakeApi {
        fn drop(&mut self) {
            self.task.abort();
        }
    }

    /// Serve any router on `127.0.0.1:0`.
    pub async fn spawn_router(router: Router) -> FakeApi {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake api");
        let addr = listener.local_addr().expect("fake api address");
        let task = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake api server");
        });
        FakeApi {
            base_url: format!("http://{}", addr),
            task,
        }
    }

    /// Serve the REST routes. With `session_cookie` set, data routes demand
    /// that exact session cookie.
    pub async fn spawn_fake_api(
        backend: Arc<MockBackend>,
        session_cookie: Option<&str>,
    ) -> FakeApi {
        spawn_router(rest_router(backend, session_cookie)).await
    }

    pub fn rest_router(backend: Arc<MockBackend>, session_cookie: Option<&str>) -> Router {
        let state = AppState {
            backend,
            session_cookie: session_cookie.map(str::to_string),
        };
        Router::new()
            .route("/api/auth-check", get(auth_check))
            .route("/api/logout", post(logout))
            .route("/api/users/current", get(current_user))
            .route("/api/items/search/:query", get(search))
            .route("/api/items/:uri", get(item))
            .route("/api/items/:uri/tags", post(add_tag))
            .route("/api/items/:uri/tags/:tag", delete(delete_tag))
            .route("/api/tags", get(tags))
            .route("/api/tags/:tag", get(tag))
            .with_state(state)
    }

    fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
        if !state.backend.is_authenticated() {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let Some(expected) = &state.session_cookie else {
            return Ok(());
        };
        let wanted = format!("{}={}", SESSION_COOKIE_NAME, expected);
        let present = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .any(|pair| pair.trim() == wanted);
        if present {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }

    fn error_response(err: LauludError) -> Response {
        let status = match err {
            LauludError::NotFound { .. } => StatusCode::NOT_FOUND,
            LauludError::Unauthenticated => StatusCode::UNAUTHORIZED,
            LauludError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, err.to_string()).into_response()
    }

    fn respond(
        state: &AppState,
        headers: &HeaderMap,
        f: impl FnOnce(&MockBackend) -> LauludResult<serde_json::Value>,
    ) -> Response {
        if let Err(status) = authorize(state, headers) {
            return status.into_response();
        }
        match f(&state.backend) {
            Ok(value) => Json(value).into_response(),
            Err(err) => error_response(err),
        }
    }

    fn parse_uri(uri: &str) -> LauludResult<SpotifyUri> {
        Ok(uri.parse::<SpotifyUri>()?)
    }

    fn to_json<T: serde::Serialize>(value: T) -> LauludResult<serde_json::Value> {
        serde_json::to_value(value).map_err(|err| LauludError::UnexpectedData {
            route: String::new(),
            expected: err.to_string(),
        })
    }

    async fn auth_check(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
        match authorize(&state, &headers) {
            Ok(()) => StatusCode::OK,
            Err(status) => status,
        }
    }

    async fn logout(State(state): State<AppState>) -> StatusCode {
        state.backend.set_authenticated(false);
        StatusCode::OK
    }

    async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
        respond(&state, &headers, |backend| to_json(backend.current_user()))
    }

    async fn search(
        State(state): State<AppState>,
        Path(query): Path<String>,
        headers: HeaderMap,
    ) -> Response {
        respond(&state, &headers, |backend| to_json(backend.search(&query)))
    }

    async fn item(
        State(state): State<AppState>,
        Path(uri): Path<String>,
        headers: HeaderMap,
    ) -> Response {
        respond(&state, &headers, |backend| {
            let uri = parse_uri(&uri)?;
            to_json(backend.item(&uri).ok_or_else(|| not_found(&uri))?)
        })
    }

    async fn add_tag(
        State(state): State<AppState>,
        Path(uri): Path<String>,
        headers: HeaderMap,
        Json(body): Json<CreateTagBody>,
    ) -> Response {
        respond(&state, &headers, |backend| {
            let uri = parse_uri(&uri)?;
            to_json(backend.add_tag(&uri, &body.tag)?)
        })
    }

    async fn delete_tag(
        State(state): State<AppState>,
        Path((uri, tag)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Response {
        respond(&state, &headers, |backend| {
            let uri = parse_uri(&uri)?;
            to_json(backend.delete_tag(&uri, &tag)?)
        })
    }

    async fn tags(State(state): State<AppState>, headers: HeaderMap) -> Response {
        respond(&state, &headers, |backend| to_json(backend.tag_summaries()))
    }

    async fn tag(
        State(state): State<AppState>,
        Path(tag): Path<String>,
        headers: HeaderMap,
    ) -> Response {
        respond(&state, &headers, |backend| to_json(backend.tag_details(&tag)))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Laulud domain types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_item_kind() -> impl Strategy<Value = ItemKind> {
        prop_oneof![
            Just(ItemKind::Track),
            Just(ItemKind::Album),
            Just(ItemKind::Artist),
        ]
    }

    /// Base62 ids like the catalog's.
    pub fn arb_item_id() -> impl Strategy<Value = String> {
        "[0-9A-Za-z]{1,22}"
    }

    pub fn arb_uri() -> impl Strategy<Value = SpotifyUri> {
        (arb_item_kind(), arb_item_id())
            .prop_map(|(kind, id)| SpotifyUri::new(kind, id).expect("generated id is valid"))
    }

    /// Already-normalized tags: no surrounding whitespace, never empty.
    pub fn arb_tag() -> impl Strategy<Value = String> {
        "[a-z0-9]([a-z0-9 _-]{0,14}[a-z0-9])?"
    }

    /// Raw user input for a tag, possibly padded.
    pub fn arb_raw_tag() -> impl Strategy<Value = String> {
        (" {0,3}", arb_tag(), " {0,3}")
            .prop_map(|(before, tag, after)| format!("{}{}{}", before, tag, after))
    }

    pub fn arb_tags() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set(arb_tag(), 0..5).prop_map(|tags| tags.into_iter().collect())
    }

    pub fn arb_item() -> impl Strategy<Value = Item> {
        (arb_uri(), "[A-Za-z ]{1,24}").prop_map(|(uri, name)| fixtures::item(&uri, &name))
    }

    pub fn arb_tagged_item() -> impl Strategy<Value = TaggedItem> {
        (arb_item(), arb_tags()).prop_map(|(item, tags)| TaggedItem::new(item, tags))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built catalog objects.

    use super::*;

    fn uri(kind: ItemKind, id: &str) -> SpotifyUri {
        SpotifyUri::new(kind, id).expect("fixture id is valid")
    }

    fn external_urls(kind: ItemKind, id: &str) -> ExternalUrls {
        ExternalUrls {
            spotify: format!("https://open.spotify.com/{}/{}", kind, id),
        }
    }

    fn href(kind: ItemKind, id: &str) -> String {
        format!("https://api.spotify.com/v1/{}s/{}", kind, id)
    }

    pub fn artist_simplified(id: &str, name: &str) -> ArtistSimplified {
        ArtistSimplified {
            external_urls: external_urls(ItemKind::Artist, id),
            href: href(ItemKind::Artist, id),
            id: id.to_string(),
            name: name.to_string(),
            uri: uri(ItemKind::Artist, id),
        }
    }

    pub fn album(id: &str, name: &str) -> AlbumSimplified {
        AlbumSimplified {
            album_group: None,
            album_type: "album".to_string(),
            artists: vec![artist_simplified("ar1", "Beach House")],
            external_urls: external_urls(ItemKind::Album, id),
            href: href(ItemKind::Album, id),
            id: id.to_string(),
            images: vec![Image {
                url: format!("https://i.scdn.co/image/{}", id),
                width: Some(640),
                height: Some(640),
            }],
            name: name.to_string(),
            release_date: "2012-05-15".to_string(),
            release_date_precision: "day".to_string(),
            uri: uri(ItemKind::Album, id),
        }
    }

    pub fn track(id: &str, name: &str) -> Track {
        Track {
            album: album("al1", "Bloom"),
            artists: vec![artist_simplified("ar1", "Beach House")],
            disc_number: 1,
            duration_ms: 243_000,
            explicit: false,
            external_urls: external_urls(ItemKind::Track, id),
            href: href(ItemKind::Track, id),
            id: id.to_string(),
            name: name.to_string(),
            popularity: 55,
            preview_url: None,
            track_number: 1,
            uri: uri(ItemKind::Track, id),
        }
    }

    pub fn artist(id: &str, name: &str) -> Artist {
        Artist {
            external_urls: external_urls(ItemKind::Artist, id),
            genres: vec!["dream pop".to_string()],
            href: href(ItemKind::Artist, id),
            id: id.to_string(),
            images: vec![],
            name: name.to_string(),
            popularity: 70,
            uri: uri(ItemKind::Artist, id),
        }
    }

    /// An item of whichever kind `uri` names.
    pub fn item(uri: &SpotifyUri, name: &str) -> Item {
        match uri.kind() {
            ItemKind::Track => Item::Track(track(uri.id(), name)),
            ItemKind::Album => Item::Album(album(uri.id(), name)),
            ItemKind::Artist => Item::Artist(artist(uri.id(), name)),
        }
    }

    pub fn tagged(item: Item, tags: &[&str]) -> TaggedItem {
        TaggedItem::new(item, tags.iter().map(|t| t.to_string()).collect())
    }

    pub fn tagged_track(id: &str, name: &str, tags: &[&str]) -> TaggedItem {
        tagged(Item::Track(track(id, name)), tags)
    }

    pub fn tagged_album(id: &str, name: &str, tags: &[&str]) -> TaggedItem {
        tagged(Item::Album(album(id, name)), tags)
    }

    pub fn tagged_artist(id: &str, name: &str, tags: &[&str]) -> TaggedItem {
        tagged(Item::Artist(artist(id, name)), tags)
    }

    pub fn current_user() -> CurrentUser {
        CurrentUser {
            id: "listener".to_string(),
            href: "https://api.spotify.com/v1/users/listener".to_string(),
            uri: "spotify:user:listener".to_string(),
            display_name: Some("Listener".to_string()),
            images: vec![],
        }
    }

    /// `spotify:track:123`, tagged `chill`.
    pub fn track_123() -> TaggedItem {
        tagged_track("123", "Myth", &["chill"])
    }

    /// A small library: three items tagged `chill`, one also `driving`,
    /// and one untagged artist.
    pub fn library() -> MockBackend {
        MockBackend::new()
            .with_item(track_123())
            .with_item(tagged_track("456", "Lazuli", &["chill", "driving"]))
            .with_item(tagged_album("al1", "Bloom", &["chill"]))
            .with_item(tagged_artist("ar1", "Beach House", &[]))
            .with_user(current_user())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Laulud-specific results.

    use super::*;

    /// Assert two items carry the same tag set, ignoring order.
    #[track_caller]
    pub fn assert_same_tags(actual: &TaggedItem, expected: &TaggedItem) {
        assert!(
            actual.same_tags(expected),
            "Tag sets differ for {}: {:?} vs {:?}",
            actual.uri(),
            actual.tags,
            expected.tags
        );
    }

    /// Assert `tag` appears exactly once on the item.
    #[track_caller]
    pub fn assert_tag_once(item: &TaggedItem, tag: &str) {
        let count = item.tags.iter().filter(|t| *t == tag).count();
        assert_eq!(count, 1, "Expected {:?} once in {:?}", tag, item.tags);
    }

    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &LauludResult<T>) {
        match result {
            Err(LauludError::NotFound { .. }) => {}
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_fatal<T: std::fmt::Debug>(result: &LauludResult<T>) {
        match result {
            Err(err) if err.is_fatal() => {}
            other => panic!("Expected a fatal error, got: {:?}", other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
