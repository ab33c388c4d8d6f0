//! Application state.
//!
//! `App` is synchronous: key handling returns an [`Effect`] and the event
//! loop runs anything that needs the network, feeding the outcome back in.

use std::collections::HashMap;

use laulud_cache::{QueryObserver, QueryOptions, QueryState};
use laulud_client::{AuthStatus, LauludClient, MutationKind, MutationState, TagMutator};
use laulud_core::{
    normalize_tag, ApiData, ApiRoute, CurrentUser, LauludError, LauludResult, SpotifyUri,
    TaggedItem,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::TuiConfig;
use crate::keys::{Action, InputMode};
use crate::nav::{guard, Route, View};
use crate::notifications::{Notification, NotificationLevel};
use crate::search::{SearchFocus, SearchViewState};
use crate::tags::{TagsFocus, TagsViewState};
use crate::theme::LauludTheme;

/// Text field currently receiving keystrokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Search,
    NewTag {
        uri: SpotifyUri,
        list_key: Option<ApiRoute>,
    },
}

/// A tag add or delete for the event loop to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMutation {
    pub kind: MutationKind,
    pub uri: SpotifyUri,
    pub tag: String,
    pub list_key: Option<ApiRoute>,
    pub optimistic: bool,
}

impl TagMutation {
    pub async fn run(self, mutator: &TagMutator) -> LauludResult<TaggedItem> {
        let list_key = self.list_key.as_ref();
        match (self.kind, self.optimistic) {
            (MutationKind::Add, _) => mutator.add_tag(&self.uri, &self.tag, list_key).await,
            (MutationKind::Delete, true) => {
                mutator
                    .delete_tag_optimistic(&self.uri, &self.tag, list_key)
                    .await
            }
            (MutationKind::Delete, false) => {
                mutator.delete_tag(&self.uri, &self.tag, list_key).await
            }
        }
    }
}

/// Work requested by a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    CheckAuth,
    Logout,
    Mutate(TagMutation),
}

pub struct App {
    pub config: TuiConfig,
    pub theme: LauludTheme,
    pub client: LauludClient,
    pub auth: AuthStatus,
    pub route: Route,
    pub search: SearchViewState,
    pub tags: TagsViewState,
    user: QueryObserver<ApiRoute, ApiData>,
    pub editing: Option<EditTarget>,
    pub tag_input: String,
    pub notifications: Vec<Notification>,
    /// An error the client cannot recover from; the loop stops on it.
    pub fatal: Option<LauludError>,
    reported: HashMap<ApiRoute, LauludError>,
}

impl App {
    /// `route` is where the user was last time. Nothing is fetched until the
    /// session check completes.
    pub fn new(config: TuiConfig, client: LauludClient, route: Route) -> Self {
        let cache = client.cache().clone();
        Self {
            theme: LauludTheme::laulud(),
            search: SearchViewState::new(&cache, config.search_debounce()),
            tags: TagsViewState::new(&cache),
            user: cache.observe(ApiRoute::CurrentUser, QueryOptions::new().enabled(false)),
            config,
            client,
            auth: AuthStatus::Checking,
            route,
            editing: None,
            tag_input: String::new(),
            notifications: Vec::new(),
            fatal: None,
            reported: HashMap::new(),
        }
    }

    pub fn input_mode(&self) -> InputMode {
        match self.editing {
            Some(_) => InputMode::Editing,
            None => InputMode::Normal,
        }
    }

    pub fn active_view(&self) -> Option<View> {
        self.route.view()
    }

    pub fn set_auth(&mut self, auth: AuthStatus) {
        info!(?auth, "Session state");
        self.auth = auth;
        self.user.set_enabled(self.auth.is_authenticated());
        self.navigate(self.route.clone());
    }

    /// Go to `route`, or wherever the session state sends it.
    pub fn navigate(&mut self, route: Route) {
        let route = guard(route, &self.auth);
        if self.auth.is_checking() {
            self.route = route;
            return;
        }
        match &route {
            Route::Search { uri, query } => {
                self.tags.hide();
                self.search.show(query.as_deref(), uri.as_ref());
            }
            Route::Tags { tag } => {
                self.search.hide();
                self.tags.show(tag.as_deref());
            }
            Route::Home | Route::Login { .. } => {
                self.search.hide();
                self.tags.hide();
            }
        }
        if route != self.route {
            debug!(from = %self.route, to = %route, "Navigate");
        }
        self.route = route;
    }

    /// Route to write to disk. The login page saves where it leads to.
    pub fn persisted_route(&self) -> String {
        match &self.route {
            Route::Login { next: Some(next) } => next.clone(),
            route => route.to_string(),
        }
    }

    pub fn login_url(&self) -> String {
        let next = match &self.route {
            Route::Login { next: Some(next) } => next.clone(),
            _ => Route::search().to_string(),
        };
        self.client.login_url(&next)
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.user
            .data()
            .and_then(|data| data.as_current_user().cloned())
    }

    pub fn user_state(&self) -> QueryState<ApiData> {
        self.user.state()
    }

    pub fn is_saving(&self) -> bool {
        self.client.tags().status().is_loading()
    }

    /// Changes whenever a tag mutation starts or settles, so the loop can
    /// redraw the saving indicator.
    pub fn subscribe_mutation_status(&self) -> watch::Receiver<MutationState> {
        self.client.tags().subscribe_status()
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    pub fn dismiss_notification(&mut self) {
        self.notifications.pop();
    }

    // ------------------------------------------------------------------------
    // Loop callbacks
    // ------------------------------------------------------------------------

    /// The cache published a revision.
    pub fn on_revision(&mut self) {
        self.search.clamp_selection();
        self.tags.clamp_selection();
        self.observe_errors();
    }

    /// The search debouncer settled on a value.
    pub fn on_search_settled(&mut self) {
        if self.search.apply_settled() && matches!(self.route, Route::Search { .. }) {
            self.route = self.search.route();
        }
    }

    pub fn on_mutation_finished(&mut self, kind: MutationKind, result: LauludResult<TaggedItem>) {
        match result {
            Ok(item) => {
                let verb = match kind {
                    MutationKind::Add => "Tagged",
                    MutationKind::Delete => "Untagged",
                };
                self.notify(
                    NotificationLevel::Success,
                    format!("{} {}", verb, item.item.name()),
                );
            }
            Err(err) => self.report(err),
        }
        self.search.clamp_selection();
        self.tags.clamp_selection();
    }

    pub fn on_logged_out(&mut self, result: LauludResult<()>) {
        match result {
            Ok(()) => {
                self.reported.clear();
                self.set_auth(AuthStatus::Unauthenticated);
                self.navigate(Route::Login { next: None });
            }
            Err(err) => self.report(err),
        }
    }

    fn report(&mut self, err: LauludError) {
        if err.is_fatal() {
            self.fatal.get_or_insert(err);
        } else if err.is_unauthenticated() && self.auth.is_authenticated() {
            warn!("Session expired");
            self.notify(NotificationLevel::Warning, "Session expired, please log in again");
            self.set_auth(AuthStatus::Unauthenticated);
        } else {
            self.notify(NotificationLevel::Error, err.to_string());
        }
    }

    /// Surface each new query error once, as a notification.
    fn observe_errors(&mut self) {
        let mut observed = self.search.observed();
        observed.extend(self.tags.observed());
        if self.user.is_enabled() {
            observed.push((self.user.key().clone(), self.user.state()));
        }

        let mut current = HashMap::new();
        let mut fresh = Vec::new();
        for (key, state) in observed {
            let Some(error) = state.error else { continue };
            if self.reported.get(&key) != Some(&error) {
                fresh.push(error.clone());
            }
            current.insert(key, error);
        }
        self.reported = current;
        for error in fresh {
            self.report(error);
        }
    }

    // ------------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------------

    pub fn handle_action(&mut self, action: Action) -> Effect {
        if action == Action::Quit {
            return Effect::Quit;
        }
        if self.auth.is_checking() {
            return Effect::None;
        }
        if self.editing.is_some() {
            return self.handle_editing(action);
        }
        match action {
            Action::Dismiss => {
                self.dismiss_notification();
                Effect::None
            }
            Action::Logout if self.auth.is_authenticated() => Effect::Logout,
            _ => match self.route.view() {
                Some(View::Search) => self.handle_search(action),
                Some(View::Tags) => self.handle_tags(action),
                None => self.handle_login(action),
            },
        }
    }

    fn handle_editing(&mut self, action: Action) -> Effect {
        let Some(target) = self.editing.clone() else {
            return Effect::None;
        };
        match (action, target) {
            (Action::InsertChar(c), EditTarget::Search) => self.search.insert_char(c),
            (Action::DeleteChar, EditTarget::Search) => self.search.delete_char(),
            (Action::Confirm, EditTarget::Search) => {
                self.editing = None;
                self.search.submit();
                self.route = self.search.route();
            }
            (Action::Cancel, EditTarget::Search) => {
                self.editing = None;
                self.search.cancel_input();
            }
            (Action::InsertChar(c), EditTarget::NewTag { .. }) => self.tag_input.push(c),
            (Action::DeleteChar, EditTarget::NewTag { .. }) => {
                self.tag_input.pop();
            }
            (Action::Confirm, EditTarget::NewTag { uri, list_key }) => {
                let raw = std::mem::take(&mut self.tag_input);
                match normalize_tag(&raw) {
                    Ok(tag) => {
                        self.editing = None;
                        return Effect::Mutate(TagMutation {
                            kind: MutationKind::Add,
                            uri,
                            tag,
                            list_key,
                            optimistic: false,
                        });
                    }
                    Err(err) => self.notify(NotificationLevel::Warning, err.to_string()),
                }
            }
            (Action::Cancel, EditTarget::NewTag { .. }) => {
                self.editing = None;
                self.tag_input.clear();
            }
            (Action::Refresh, _) => self.refetch(),
            _ => {}
        }
        Effect::None
    }

    fn handle_search(&mut self, action: Action) -> Effect {
        match action {
            Action::NextView => self.navigate(self.tags.route()),
            Action::EditSearch => {
                self.search.input = self.search.query().to_string();
                self.editing = Some(EditTarget::Search);
            }
            Action::MoveDown => self.search.select_next(),
            Action::MoveUp => self.search.select_previous(),
            Action::NextTab if self.search.focus == SearchFocus::Results => self.search.next_tab(),
            Action::PrevTab if self.search.focus == SearchFocus::Results => self.search.prev_tab(),
            Action::Select if self.search.focus == SearchFocus::Results => {
                if let Some(item) = self.search.highlighted() {
                    self.open_item(item.uri().clone());
                }
            }
            Action::Back if self.search.focus == SearchFocus::Item => {
                let query = self.search.query().to_string();
                self.navigate(Route::Search {
                    uri: None,
                    query: (!query.is_empty()).then_some(query),
                });
            }
            Action::AddTag => {
                if let Some(uri) = self.search.selected_uri().cloned() {
                    self.begin_tag_input(uri, self.search.list_key());
                }
            }
            Action::DeleteTag if self.search.focus == SearchFocus::Item => {
                let uri = self.search.selected_uri().cloned();
                if let (Some(uri), Some(tag)) = (uri, self.search.selected_tag()) {
                    return Effect::Mutate(TagMutation {
                        kind: MutationKind::Delete,
                        uri,
                        tag,
                        list_key: self.search.list_key(),
                        optimistic: true,
                    });
                }
            }
            Action::Refresh => self.refetch(),
            _ => {}
        }
        Effect::None
    }

    fn handle_tags(&mut self, action: Action) -> Effect {
        match action {
            Action::NextView => self.navigate(self.search.route()),
            Action::MoveDown => self.tags.select_next(),
            Action::MoveUp => self.tags.select_previous(),
            Action::Select => match self.tags.focus {
                TagsFocus::List => {
                    if let Some(tag) = self.tags.highlighted_tag() {
                        self.navigate(Route::Tags { tag: Some(tag) });
                    }
                }
                TagsFocus::Details => {
                    if let Some(item) = self.tags.highlighted_item() {
                        self.open_item(item.uri().clone());
                    }
                }
            },
            Action::Back if self.tags.focus == TagsFocus::Details => {
                self.navigate(Route::Tags { tag: None });
            }
            Action::AddTag if self.tags.focus == TagsFocus::Details => {
                if let Some(item) = self.tags.highlighted_item() {
                    self.begin_tag_input(item.uri().clone(), self.tags.list_key());
                }
            }
            Action::DeleteTag if self.tags.focus == TagsFocus::Details => {
                let tag = self.tags.tag().map(str::to_string);
                if let (Some(item), Some(tag)) = (self.tags.highlighted_item(), tag) {
                    return Effect::Mutate(TagMutation {
                        kind: MutationKind::Delete,
                        uri: item.uri().clone(),
                        tag,
                        list_key: self.tags.list_key(),
                        optimistic: false,
                    });
                }
            }
            Action::Refresh => self.refetch(),
            _ => {}
        }
        Effect::None
    }

    fn handle_login(&mut self, action: Action) -> Effect {
        match action {
            Action::Select | Action::Refresh => Effect::CheckAuth,
            _ => Effect::None,
        }
    }

    fn open_item(&mut self, uri: SpotifyUri) {
        let query = self.search.query().to_string();
        self.navigate(Route::Search {
            uri: Some(uri),
            query: (!query.is_empty()).then_some(query),
        });
    }

    fn begin_tag_input(&mut self, uri: SpotifyUri, list_key: Option<ApiRoute>) {
        self.tag_input.clear();
        self.editing = Some(EditTarget::NewTag { uri, list_key });
    }

    fn refetch(&mut self) {
        match self.route.view() {
            Some(View::Search) => self.search.refetch(),
            Some(View::Tags) => self.tags.refetch(),
            None => {}
        }
        self.user.refetch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laulud_cache::CacheConfig;
    use laulud_core::TransportError;
    use laulud_test_utils::{fixtures, MockTransport};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    fn config() -> TuiConfig {
        TuiConfig::from_toml(
            r#"
api_base_url = "http://localhost:8000"
transport = "rest"
request_timeout_ms = 1000
search_debounce_ms = 500
refresh_interval_ms = 250
persistence_path = "/tmp/laulud/state.json"
log_path = "/tmp/laulud/laulud.log"

[cache]
stale_time_ms = 0
gc_time_ms = 60000

[auth]

[theme]
name = "laulud"
"#,
        )
        .unwrap()
    }

    fn setup(route: &str) -> (App, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(Arc::new(fixtures::library())));
        let client = LauludClient::new(transport.clone(), CacheConfig::default());
        let app = App::new(config(), client, route.parse().unwrap());
        (app, transport)
    }

    async fn settle(app: &mut App) {
        sleep(Duration::from_millis(10)).await;
        app.on_revision();
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fetched_while_checking() {
        let (mut app, transport) = setup("/tags");
        assert_eq!(app.handle_action(Action::MoveDown), Effect::None);
        settle(&mut app).await;
        assert!(transport.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthenticated_redirects_with_next() {
        let (mut app, transport) = setup("/tags/chill");
        app.set_auth(AuthStatus::Unauthenticated);
        settle(&mut app).await;

        assert_eq!(app.route.to_string(), "/login?next=%2Ftags%2Fchill");
        assert!(transport.queries().is_empty());
        assert_eq!(app.persisted_route(), "/tags/chill");
        assert_eq!(app.handle_action(Action::Select), Effect::CheckAuth);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restored_route_loads_after_login() {
        let (mut app, transport) = setup("/tags/chill");
        app.set_auth(AuthStatus::Authenticated);
        settle(&mut app).await;

        assert_eq!(app.route.to_string(), "/tags/chill");
        assert_eq!(transport.query_count(&ApiRoute::Tag("chill".to_string())), 1);
        assert_eq!(transport.query_count(&ApiRoute::CurrentUser), 1);
        assert!(app.current_user().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_selecting_tag_row_navigates() {
        let (mut app, transport) = setup("/tags");
        app.set_auth(AuthStatus::Authenticated);
        settle(&mut app).await;

        app.handle_action(Action::Select);
        settle(&mut app).await;

        assert_eq!(app.route.to_string(), "/tags/chill");
        assert_eq!(transport.query_count(&ApiRoute::Tag("chill".to_string())), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_input_updates_route() {
        let (mut app, _) = setup("/search");
        app.set_auth(AuthStatus::Authenticated);

        app.handle_action(Action::EditSearch);
        assert_eq!(app.input_mode(), InputMode::Editing);
        for c in "my".chars() {
            app.handle_action(Action::InsertChar(c));
        }
        sleep(Duration::from_millis(600)).await;
        app.on_search_settled();

        assert_eq!(app.route.to_string(), "/search?q=my");
        app.handle_action(Action::Cancel);
        assert_eq!(app.input_mode(), InputMode::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_tag_from_item_pane() {
        let (mut app, _) = setup("/search/spotify:track:123?q=m");
        app.set_auth(AuthStatus::Authenticated);
        settle(&mut app).await;

        app.handle_action(Action::AddTag);
        for c in " driving ".chars() {
            app.handle_action(Action::InsertChar(c));
        }
        let effect = app.handle_action(Action::Confirm);

        let uri: SpotifyUri = "spotify:track:123".parse().unwrap();
        assert_eq!(
            effect,
            Effect::Mutate(TagMutation {
                kind: MutationKind::Add,
                uri: uri.clone(),
                tag: "driving".to_string(),
                list_key: Some(ApiRoute::ItemSearch("m".to_string())),
                optimistic: false,
            })
        );
        let Effect::Mutate(mutation) = effect else { unreachable!() };
        let result = mutation.run(app.client.tags()).await;
        app.on_mutation_finished(MutationKind::Add, result);

        assert_eq!(app.search.item_tags(), vec!["chill", "driving"]);
        let listed = app.search.visible_items();
        let listed = listed.iter().find(|i| i.uri() == &uri).unwrap();
        assert!(listed.has_tag("driving"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_tag_is_rejected_without_request() {
        let (mut app, transport) = setup("/search/spotify:track:123");
        app.set_auth(AuthStatus::Authenticated);
        settle(&mut app).await;

        app.handle_action(Action::AddTag);
        app.handle_action(Action::InsertChar(' '));
        assert_eq!(app.handle_action(Action::Confirm), Effect::None);

        assert!(transport.mutations().is_empty());
        assert_eq!(
            app.last_notification().unwrap().level,
            NotificationLevel::Warning
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_notifies_once() {
        let (mut app, transport) = setup("/tags");
        transport.fail_route(ApiRoute::Tags, LauludError::from_status(500, "boom", "/api/tags"));
        app.set_auth(AuthStatus::Authenticated);
        settle(&mut app).await;
        app.on_revision();

        let errors = app
            .notifications
            .iter()
            .filter(|n| n.level == NotificationLevel::Error)
            .count();
        assert_eq!(errors, 1);
        app.handle_action(Action::Dismiss);
        assert!(app.last_notification().is_none());
        assert!(app.fatal.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_mismatch_is_fatal() {
        let (mut app, transport) = setup("/tags");
        transport.fail_route(
            ApiRoute::Tags,
            LauludError::Transport(TransportError::Decode {
                reason: "missing field `num_items`".to_string(),
            }),
        );
        app.set_auth(AuthStatus::Authenticated);
        settle(&mut app).await;

        assert!(app.fatal.as_ref().is_some_and(LauludError::is_fatal));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_returns_to_login() {
        let (mut app, transport) = setup("/tags");
        transport.fail_route(ApiRoute::Tags, LauludError::Unauthenticated);
        app.set_auth(AuthStatus::Authenticated);
        settle(&mut app).await;

        assert_eq!(app.auth, AuthStatus::Unauthenticated);
        assert_eq!(app.route.to_string(), "/login?next=%2Ftags");
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_goes_to_login() {
        let (mut app, _) = setup("/tags");
        app.set_auth(AuthStatus::Authenticated);
        settle(&mut app).await;

        assert_eq!(app.handle_action(Action::Logout), Effect::Logout);
        let result = app.client.logout().await;
        app.on_logged_out(result);

        assert_eq!(app.route, Route::Login { next: None });
        assert!(!app.client.cache().contains(&ApiRoute::Tags));
    }
}
