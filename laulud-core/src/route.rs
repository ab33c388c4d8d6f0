//! Resource keys and the data they resolve to.
//!
//! An [`ApiRoute`] is the canonical cache key for a fetchable resource. It
//! maps one-to-one onto a REST path under `/api/` and onto exactly one
//! [`ApiData`] variant.

use crate::error::LauludError;
use crate::item::SpotifyUri;
use crate::tag::{ItemSearchResponse, TagDetails, TagSummary, TaggedItem};
use crate::user::CurrentUser;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApiRoute {
    CurrentUser,
    Item(SpotifyUri),
    ItemSearch(String),
    Tags,
    Tag(String),
}

impl ApiRoute {
    /// Raw (unencoded) path segments of the key.
    pub fn segments(&self) -> Vec<String> {
        match self {
            ApiRoute::CurrentUser => vec!["users".to_string(), "current".to_string()],
            ApiRoute::Item(uri) => vec!["items".to_string(), uri.to_string()],
            ApiRoute::ItemSearch(query) => {
                vec!["items".to_string(), "search".to_string(), query.clone()]
            }
            ApiRoute::Tags => vec!["tags".to_string()],
            ApiRoute::Tag(tag) => vec!["tags".to_string(), tag.clone()],
        }
    }

    /// REST path, each segment percent-encoded.
    pub fn path(&self) -> String {
        encode_path(&self.segments())
    }

    /// Name of the [`ApiData`] variant this key resolves to.
    pub fn expected_data(&self) -> &'static str {
        match self {
            ApiRoute::CurrentUser => "CurrentUser",
            ApiRoute::Item(_) => "Item",
            ApiRoute::ItemSearch(_) => "ItemSearch",
            ApiRoute::Tags => "Tags",
            ApiRoute::Tag(_) => "Tag",
        }
    }

    pub fn accepts(&self, data: &ApiData) -> bool {
        matches!(
            (self, data),
            (ApiRoute::CurrentUser, ApiData::CurrentUser(_))
                | (ApiRoute::Item(_), ApiData::Item(_))
                | (ApiRoute::ItemSearch(_), ApiData::ItemSearch(_))
                | (ApiRoute::Tags, ApiData::Tags(_))
                | (ApiRoute::Tag(_), ApiData::Tag(_))
        )
    }

    /// Fail with a schema-mismatch error when `data` is not the variant this
    /// key resolves to.
    pub fn check(&self, data: ApiData) -> Result<ApiData, LauludError> {
        if self.accepts(&data) {
            Ok(data)
        } else {
            Err(LauludError::UnexpectedData {
                route: self.path(),
                expected: self.expected_data().to_string(),
            })
        }
    }

    /// Whether a mutation of this item can change the data behind this key.
    pub fn may_contain(&self, uri: &SpotifyUri) -> bool {
        match self {
            ApiRoute::Item(own) => own == uri,
            ApiRoute::ItemSearch(_) | ApiRoute::Tags | ApiRoute::Tag(_) => true,
            ApiRoute::CurrentUser => false,
        }
    }
}

impl fmt::Display for ApiRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Build `/api/<seg>/<seg>...` with every segment percent-encoded.
pub fn encode_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut path = String::from("/api");
    for segment in segments {
        path.push('/');
        path.push_str(&urlencoding::encode(segment.as_ref()));
    }
    path
}

/// Output of a resolved [`ApiRoute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiData {
    CurrentUser(CurrentUser),
    Item(TaggedItem),
    ItemSearch(ItemSearchResponse),
    Tags(Vec<TagSummary>),
    Tag(TagDetails),
}

impl ApiData {
    pub fn as_current_user(&self) -> Option<&CurrentUser> {
        match self {
            ApiData::CurrentUser(user) => Some(user),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&TaggedItem> {
        match self {
            ApiData::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_search(&self) -> Option<&ItemSearchResponse> {
        match self {
            ApiData::ItemSearch(results) => Some(results),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> Option<&[TagSummary]> {
        match self {
            ApiData::Tags(tags) => Some(tags),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&TagDetails> {
        match self {
            ApiData::Tag(details) => Some(details),
            _ => None,
        }
    }

    /// The copy of item `uri` held by this data, if any.
    pub fn find_item(&self, uri: &SpotifyUri) -> Option<&TaggedItem> {
        match self {
            ApiData::Item(item) if item.uri() == uri => Some(item),
            ApiData::ItemSearch(results) => results.find(uri),
            ApiData::Tag(details) => details.items.iter().find(|item| item.uri() == uri),
            _ => None,
        }
    }

    /// Copy of this data with `updated` written over the matching item, or
    /// `None` when the data does not hold the item. Tag summaries are never
    /// patched (their counts are server-computed) and must be refetched.
    pub fn with_item(&self, updated: &TaggedItem) -> Option<ApiData> {
        match self {
            ApiData::Item(current) if current.uri() == updated.uri() => {
                Some(ApiData::Item(updated.clone()))
            }
            ApiData::ItemSearch(results) => {
                let mut results = results.clone();
                results
                    .replace_item(updated)
                    .then_some(ApiData::ItemSearch(results))
            }
            ApiData::Tag(details) => {
                let mut details = details.clone();
                details.apply_item(updated).then_some(ApiData::Tag(details))
            }
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
