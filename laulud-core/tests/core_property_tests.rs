use laulud_core::{
    normalize_tag, Artist, ExternalUrls, Item, ItemKind, SpotifyUri, TaggedItem,
};
use proptest::prelude::*;

fn artist_item(id: &str) -> Item {
    Item::Artist(Artist {
        external_urls: ExternalUrls::default(),
        genres: vec![],
        href: String::new(),
        id: id.to_string(),
        images: vec![],
        name: id.to_string(),
        popularity: 0,
        uri: SpotifyUri::new(ItemKind::Artist, id).unwrap(),
    })
}

fn arb_kind() -> impl Strategy<Value = ItemKind> {
    prop_oneof![
        Just(ItemKind::Track),
        Just(ItemKind::Album),
        Just(ItemKind::Artist)
    ]
}

proptest! {
    #[test]
    fn uri_display_parses_back(kind in arb_kind(), id in "[A-Za-z0-9]{1,22}") {
        let uri = SpotifyUri::new(kind, id.clone()).unwrap();
        let parsed: SpotifyUri = uri.to_string().parse().unwrap();
        prop_assert_eq!(parsed.kind(), kind);
        prop_assert_eq!(parsed.id(), id.as_str());
    }

    #[test]
    fn with_tag_never_duplicates(
        initial in proptest::collection::vec("[a-z]{1,6}", 0..6),
        additions in proptest::collection::vec("[a-z]{1,6}", 0..6),
    ) {
        let mut item = TaggedItem::new(artist_item("a"), initial);
        for tag in &additions {
            item = item.with_tag(tag);
            item = item.with_tag(tag);
        }
        let mut seen = std::collections::HashSet::new();
        for tag in &item.tags {
            prop_assert!(seen.insert(tag.clone()), "duplicate tag {}", tag);
        }
        for tag in &additions {
            prop_assert!(item.has_tag(tag));
        }
    }

    #[test]
    fn without_tag_removes_only_that_tag(
        tags in proptest::collection::vec("[a-z]{1,6}", 1..6),
        index in 0usize..6,
    ) {
        let item = TaggedItem::new(artist_item("a"), tags);
        let victim = item.tags[index % item.tags.len()].clone();
        let removed = item.without_tag(&victim);
        prop_assert!(!removed.has_tag(&victim));
        prop_assert_eq!(removed.tags.len(), item.tags.len() - 1);
    }

    #[test]
    fn normalized_tags_have_no_surrounding_whitespace(raw in "\\s{0,3}[a-z ]{0,8}\\s{0,3}") {
        match normalize_tag(&raw) {
            Ok(tag) => {
                prop_assert!(!tag.is_empty());
                prop_assert_eq!(tag.trim(), tag.as_str());
            }
            Err(_) => prop_assert!(raw.trim().is_empty()),
        }
    }
}
