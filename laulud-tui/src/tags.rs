//! Tags view state: the tag summary list and the details of one tag.

use laulud_cache::{QueryObserver, QueryOptions, QueryState};
use laulud_client::LauludCache;
use laulud_core::{ApiData, ApiRoute, TagSummary, TaggedItem};

use crate::nav::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagsFocus {
    #[default]
    List,
    Details,
}

pub struct TagsViewState {
    cache: LauludCache,
    list: QueryObserver<ApiRoute, ApiData>,
    details: QueryObserver<ApiRoute, ApiData>,
    tag: Option<String>,
    pub selected: usize,
    pub selected_item: usize,
    pub focus: TagsFocus,
}

impl TagsViewState {
    pub fn new(cache: &LauludCache) -> Self {
        let disabled = QueryOptions::new().enabled(false);
        Self {
            cache: cache.clone(),
            list: cache.observe(ApiRoute::Tags, disabled.clone()),
            details: cache.observe(ApiRoute::Tag(String::new()), disabled),
            tag: None,
            selected: 0,
            selected_item: 0,
            focus: TagsFocus::List,
        }
    }

    /// Bring the view in line with a tags route. The summary list is marked
    /// stale first, so counts changed from other views are refetched on
    /// focus.
    pub fn show(&mut self, tag: Option<&str>) {
        if !self.list.is_enabled() {
            self.cache.invalidate(&ApiRoute::Tags);
            self.list.set_enabled(true);
        }
        self.open(tag.map(str::to_string));
    }

    pub fn hide(&mut self) {
        self.list.set_enabled(false);
        self.details.set_enabled(false);
    }

    pub fn open(&mut self, tag: Option<String>) {
        match &tag {
            Some(tag) => {
                self.details.set_key(ApiRoute::Tag(tag.clone()));
                self.details.set_enabled(true);
                if let Some(index) = self.summaries().iter().position(|s| &s.tag == tag) {
                    self.selected = index;
                }
                self.focus = TagsFocus::Details;
            }
            None => {
                self.details.set_enabled(false);
                self.focus = TagsFocus::List;
            }
        }
        if tag != self.tag {
            self.selected_item = 0;
        }
        self.tag = tag;
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn list_state(&self) -> QueryState<ApiData> {
        self.list.state()
    }

    pub fn details_state(&self) -> QueryState<ApiData> {
        self.details.state()
    }

    pub fn summaries(&self) -> Vec<TagSummary> {
        self.list
            .data()
            .and_then(|data| data.as_tags().map(<[TagSummary]>::to_vec))
            .unwrap_or_default()
    }

    pub fn items(&self) -> Vec<TaggedItem> {
        self.details
            .data()
            .and_then(|data| data.as_tag().map(|details| details.items.clone()))
            .unwrap_or_default()
    }

    pub fn highlighted_tag(&self) -> Option<String> {
        self.summaries().get(self.selected).map(|s| s.tag.clone())
    }

    pub fn highlighted_item(&self) -> Option<TaggedItem> {
        self.items().get(self.selected_item).cloned()
    }

    /// The list key mutations from the details pane patch.
    pub fn list_key(&self) -> Option<ApiRoute> {
        self.tag.clone().map(ApiRoute::Tag)
    }

    pub fn select_next(&mut self) {
        let len = match self.focus {
            TagsFocus::List => self.summaries().len(),
            TagsFocus::Details => self.items().len(),
        };
        let cursor = match self.focus {
            TagsFocus::List => &mut self.selected,
            TagsFocus::Details => &mut self.selected_item,
        };
        if len > 0 {
            *cursor = (*cursor + 1).min(len - 1);
        }
    }

    pub fn select_previous(&mut self) {
        match self.focus {
            TagsFocus::List => self.selected = self.selected.saturating_sub(1),
            TagsFocus::Details => self.selected_item = self.selected_item.saturating_sub(1),
        }
    }

    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.summaries().len().saturating_sub(1));
        self.selected_item = self
            .selected_item
            .min(self.items().len().saturating_sub(1));
    }

    pub fn refetch(&self) {
        self.list.refetch();
        self.details.refetch();
    }

    pub fn observed(&self) -> Vec<(ApiRoute, QueryState<ApiData>)> {
        [&self.list, &self.details]
            .into_iter()
            .filter(|observer| observer.is_enabled())
            .map(|observer| (observer.key().clone(), observer.state()))
            .collect()
    }

    pub fn route(&self) -> Route {
        Route::Tags {
            tag: self.tag.clone(),
        }
    }
}
