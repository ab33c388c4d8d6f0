//! Tags and tagged items.

use crate::error::ValidationError;
use crate::item::{Item, ItemKind, SpotifyUri};
use serde::{Deserialize, Deserializer, Serialize};

/// Trim a user-entered tag and reject it if nothing is left.
pub fn normalize_tag(raw: &str) -> Result<String, ValidationError> {
    let tag = raw.trim();
    if tag.is_empty() {
        return Err(ValidationError::EmptyTag);
    }
    Ok(tag.to_string())
}

/// An item paired with its current tag set.
///
/// `tags` behaves as a set: duplicates are dropped on decode and the helpers
/// below never introduce one. Order is preserved for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedItem {
    pub item: Item,
    #[serde(deserialize_with = "deserialize_tag_set")]
    pub tags: Vec<String>,
}

fn deserialize_tag_set<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = Vec::<String>::deserialize(deserializer)?;
    Ok(dedup_tags(tags))
}

fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

impl TaggedItem {
    pub fn new(item: Item, tags: Vec<String>) -> Self {
        Self {
            item,
            tags: dedup_tags(tags),
        }
    }

    pub fn uri(&self) -> &SpotifyUri {
        self.item.uri()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Expected server result of adding `tag`. Adding an existing tag is a
    /// no-op.
    pub fn with_tag(&self, tag: &str) -> TaggedItem {
        let mut next = self.clone();
        if !next.has_tag(tag) {
            next.tags.push(tag.to_string());
        }
        next
    }

    /// Expected server result of deleting `tag`. Deleting an absent tag is a
    /// no-op.
    pub fn without_tag(&self, tag: &str) -> TaggedItem {
        let mut next = self.clone();
        next.tags.retain(|t| t != tag);
        next
    }

    /// Set equality on tags, ignoring order.
    pub fn same_tags(&self, other: &TaggedItem) -> bool {
        self.tags.len() == other.tags.len() && self.tags.iter().all(|t| other.has_tag(t))
    }
}

/// One row of the tag list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    pub tag: String,
    pub num_items: u32,
}

impl TagSummary {
    /// Secondary text for the row, e.g. `"3 items"` or `"1 item"`.
    pub fn items_label(&self) -> String {
        if self.num_items == 1 {
            "1 item".to_string()
        } else {
            format!("{} items", self.num_items)
        }
    }
}

/// All items carrying one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDetails {
    pub tag: String,
    pub items: Vec<TaggedItem>,
}

impl TagDetails {
    /// Patch this listing with an updated item. The item is replaced in
    /// place while it still carries this tag and removed once it does not.
    /// Returns whether anything changed.
    pub fn apply_item(&mut self, updated: &TaggedItem) -> bool {
        let position = self.items.iter().position(|t| t.uri() == updated.uri());
        match (position, updated.has_tag(&self.tag)) {
            (Some(index), true) => {
                self.items[index] = updated.clone();
                true
            }
            (Some(index), false) => {
                self.items.remove(index);
                true
            }
            (None, true) => {
                self.items.push(updated.clone());
                true
            }
            (None, false) => false,
        }
    }
}

/// Body of `POST /api/items/<uri>/tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTagBody {
    pub tag: String,
}

/// Search results grouped by item kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSearchResponse {
    pub tracks: Vec<TaggedItem>,
    pub albums: Vec<TaggedItem>,
    pub artists: Vec<TaggedItem>,
}

impl ItemSearchResponse {
    pub fn items(&self, kind: ItemKind) -> &[TaggedItem] {
        match kind {
            ItemKind::Track => &self.tracks,
            ItemKind::Album => &self.albums,
            ItemKind::Artist => &self.artists,
        }
    }

    fn items_mut(&mut self, kind: ItemKind) -> &mut Vec<TaggedItem> {
        match kind {
            ItemKind::Track => &mut self.tracks,
            ItemKind::Album => &mut self.albums,
            ItemKind::Artist => &mut self.artists,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len() + self.albums.len() + self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, uri: &SpotifyUri) -> Option<&TaggedItem> {
        self.items(uri.kind()).iter().find(|t| t.uri() == uri)
    }

    /// Replace the matching item in place. Order is preserved and items
    /// absent from the results are not added.
    pub fn replace_item(&mut self, updated: &TaggedItem) -> bool {
        let list = self.items_mut(updated.item.kind());
        match list.iter_mut().find(|t| t.uri() == updated.uri()) {
            Some(slot) => {
                *slot = updated.clone();
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Artist, ExternalUrls};

    fn artist(id: &str) -> Item {
        Item::Artist(Artist {
            external_urls: ExternalUrls::default(),
            genres: vec![],
            href: String::new(),
            id: id.to_string(),
            images: vec![],
            name: format!("Artist {}", id),
            popularity: 0,
            uri: SpotifyUri::new(ItemKind::Artist, id).unwrap(),
        })
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  chill ").unwrap(), "chill");
        assert_eq!(normalize_tag("   "), Err(ValidationError::EmptyTag));
        assert_eq!(normalize_tag(""), Err(ValidationError::EmptyTag));
    }

    #[test]
    fn test_with_tag_is_idempotent() {
        let item = TaggedItem::new(artist("a"), vec!["chill".to_string()]);
        let once = item.with_tag("driving");
        let twice = once.with_tag("driving");
        assert_eq!(once, twice);
        assert_eq!(twice.tags, vec!["chill", "driving"]);
    }

    #[test]
    fn test_without_absent_tag_is_noop() {
        let item = TaggedItem::new(artist("a"), vec!["chill".to_string()]);
        assert_eq!(item.without_tag("missing"), item);
        assert!(item.without_tag("chill").tags.is_empty());
    }

    #[test]
    fn test_decode_drops_duplicate_tags() {
        let json = serde_json::json!({
            "item": serde_json::to_value(artist("a")).unwrap(),
            "tags": ["x", "y", "x"]
        });
        let item: TaggedItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.tags, vec!["x", "y"]);
    }

    #[test]
    fn test_items_label_pluralization() {
        let one = TagSummary {
            tag: "chill".to_string(),
            num_items: 1,
        };
        let many = TagSummary {
            tag: "chill".to_string(),
            num_items: 3,
        };
        let none = TagSummary {
            tag: "chill".to_string(),
            num_items: 0,
        };
        assert_eq!(one.items_label(), "1 item");
        assert_eq!(many.items_label(), "3 items");
        assert_eq!(none.items_label(), "0 items");
    }

    #[test]
    fn test_tag_details_apply_item() {
        let a = TaggedItem::new(artist("a"), vec!["chill".to_string()]);
        let b = TaggedItem::new(artist("b"), vec!["chill".to_string()]);
        let mut details = TagDetails {
            tag: "chill".to_string(),
            items: vec![a.clone(), b.clone()],
        };

        assert!(details.apply_item(&a.with_tag("x")));
        assert_eq!(details.items[0].tags, vec!["chill", "x"]);

        assert!(details.apply_item(&b.without_tag("chill")));
        assert_eq!(details.items.len(), 1);

        let c = TaggedItem::new(artist("c"), vec![]);
        assert!(!details.apply_item(&c));
    }

    #[test]
    fn test_search_replace_item_in_place() {
        let a = TaggedItem::new(artist("a"), vec![]);
        let b = TaggedItem::new(artist("b"), vec![]);
        let mut results = ItemSearchResponse {
            artists: vec![a.clone(), b.clone()],
            ..Default::default()
        };
        assert!(results.replace_item(&b.with_tag("t")));
        assert_eq!(results.artists[0], a);
        assert_eq!(results.artists[1].tags, vec!["t"]);

        let c = TaggedItem::new(artist("c"), vec!["t".to_string()]);
        assert!(!results.replace_item(&c));
        assert_eq!(results.len(), 2);
    }
}
