//! Catalog items: tracks, albums and artists.
//!
//! Items are immutable snapshots of the external catalog. Identity is the
//! [`SpotifyUri`]; two items with the same URI describe the same entity.

use crate::error::{LauludError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// URI
// ============================================================================

/// The kinds of catalog entity that can be tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Track,
    Album,
    Artist,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [ItemKind::Track, ItemKind::Album, ItemKind::Artist];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Track => "track",
            ItemKind::Album => "album",
            ItemKind::Artist => "artist",
        }
    }

    /// Plural label used for search result tabs.
    pub fn plural_label(&self) -> &'static str {
        match self {
            ItemKind::Track => "Tracks",
            ItemKind::Album => "Albums",
            ItemKind::Artist => "Artists",
        }
    }

    /// Resolve a GraphQL `__typename`. Anything outside the closed set is a
    /// schema mismatch.
    pub fn from_typename(typename: &str) -> Result<Self, LauludError> {
        match typename {
            "Track" => Ok(ItemKind::Track),
            "AlbumSimplified" | "Album" => Ok(ItemKind::Album),
            "Artist" => Ok(ItemKind::Artist),
            other => Err(LauludError::UnknownItemType {
                item_type: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = LauludError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(ItemKind::Track),
            "album" => Ok(ItemKind::Album),
            "artist" => Ok(ItemKind::Artist),
            other => Err(LauludError::UnknownItemType {
                item_type: other.to_string(),
            }),
        }
    }
}

/// A parsed and validated catalog URI of the form `spotify:<kind>:<id>`.
///
/// Valid means well-formed, not that the entity exists remotely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpotifyUri {
    kind: ItemKind,
    id: String,
}

impl SpotifyUri {
    pub fn new(kind: ItemKind, id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() || id.contains(':') {
            return Err(ValidationError::InvalidUri {
                uri: format!("spotify:{}:{}", kind, id),
                reason: "id must be non-empty and contain no ':'".to_string(),
            });
        }
        Ok(Self { kind, id })
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for SpotifyUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spotify:{}:{}", self.kind, self.id)
    }
}

impl FromStr for SpotifyUri {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidUri {
            uri: value.to_string(),
            reason: reason.to_string(),
        };
        match value.split(':').collect::<Vec<&str>>().as_slice() {
            ["spotify", kind, id] => {
                let kind = kind
                    .parse::<ItemKind>()
                    .map_err(|_| invalid(&format!("unknown item type {}", kind)))?;
                SpotifyUri::new(kind, *id).map_err(|_| invalid("empty id"))
            }
            _ => Err(invalid("expected spotify:<type>:<id>")),
        }
    }
}

impl TryFrom<String> for SpotifyUri {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpotifyUri> for String {
    fn from(uri: SpotifyUri) -> Self {
        uri.to_string()
    }
}

// ============================================================================
// CATALOG OBJECTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSimplified {
    pub external_urls: ExternalUrls,
    pub href: String,
    pub id: String,
    pub name: String,
    pub uri: SpotifyUri,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub genres: Vec<String>,
    pub href: String,
    pub id: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub name: String,
    #[serde(default)]
    pub popularity: i32,
    pub uri: SpotifyUri,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSimplified {
    #[serde(default)]
    pub album_group: Option<String>,
    pub album_type: String,
    pub artists: Vec<ArtistSimplified>,
    pub external_urls: ExternalUrls,
    pub href: String,
    pub id: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub name: String,
    pub release_date: String,
    #[serde(default)]
    pub release_date_precision: String,
    pub uri: SpotifyUri,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub album: AlbumSimplified,
    pub artists: Vec<ArtistSimplified>,
    #[serde(default)]
    pub disc_number: i32,
    pub duration_ms: i32,
    #[serde(default)]
    pub explicit: bool,
    pub external_urls: ExternalUrls,
    pub href: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub popularity: i32,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub track_number: i32,
    pub uri: SpotifyUri,
}

// ============================================================================
// ITEM
// ============================================================================

/// Anything that can be fetched from the catalog and tagged.
///
/// Closed set: an unknown `type` tag fails to decode, which the client treats
/// as a fatal schema mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
#[allow(clippy::large_enum_variant)]
pub enum Item {
    Track(Track),
    Album(AlbumSimplified),
    Artist(Artist),
}

impl Item {
    pub fn uri(&self) -> &SpotifyUri {
        match self {
            Item::Track(track) => &track.uri,
            Item::Album(album) => &album.uri,
            Item::Artist(artist) => &artist.uri,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Track(_) => ItemKind::Track,
            Item::Album(_) => ItemKind::Album,
            Item::Artist(_) => ItemKind::Artist,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Track(track) => &track.name,
            Item::Album(album) => &album.name,
            Item::Artist(artist) => &artist.name,
        }
    }

    /// Tracks borrow their album's artwork.
    pub fn images(&self) -> &[Image] {
        match self {
            Item::Track(track) => &track.album.images,
            Item::Album(album) => &album.images,
            Item::Artist(artist) => &artist.images,
        }
    }

    pub fn external_url(&self) -> &str {
        match self {
            Item::Track(track) => &track.external_urls.spotify,
            Item::Album(album) => &album.external_urls.spotify,
            Item::Artist(artist) => &artist.external_urls.spotify,
        }
    }

    pub fn artists(&self) -> &[ArtistSimplified] {
        match self {
            Item::Track(track) => &track.artists,
            Item::Album(album) => &album.artists,
            Item::Artist(_) => &[],
        }
    }

    /// Secondary line shown under the item name in lists.
    pub fn subtitle(&self) -> String {
        let artist_names = || {
            self.artists()
                .iter()
                .map(|artist| artist.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Item::Track(track) => format!("{} · {}", artist_names(), track.album.name),
            Item::Album(album) => format!("{} · {}", artist_names(), album.release_date),
            Item::Artist(artist) => artist.genres.join(", "),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn artist_json() -> serde_json::Value {
        serde_json::json!({
            "external_urls": {"spotify": "https://open.spotify.com/artist/a1"},
            "genres": ["shoegaze"],
            "href": "https://api.spotify.com/v1/artists/a1",
            "id": "a1",
            "images": [],
            "name": "Slowdive",
            "popularity": 60,
            "uri": "spotify:artist:a1"
        })
    }

    #[test]
    fn test_uri_parse_and_display() {
        let uri: SpotifyUri = "spotify:track:123".parse().unwrap();
        assert_eq!(uri.kind(), ItemKind::Track);
        assert_eq!(uri.id(), "123");
        assert_eq!(uri.to_string(), "spotify:track:123");
    }

    #[test]
    fn test_uri_rejects_bad_shapes() {
        assert!("spotify:track".parse::<SpotifyUri>().is_err());
        assert!("spotify:track:1:2".parse::<SpotifyUri>().is_err());
        assert!("apple:track:1".parse::<SpotifyUri>().is_err());
        assert!("spotify:episode:1".parse::<SpotifyUri>().is_err());
        assert!("spotify:track:".parse::<SpotifyUri>().is_err());
    }

    #[test]
    fn test_uri_serde_is_string() {
        let uri: SpotifyUri = "spotify:album:xyz".parse().unwrap();
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, "\"spotify:album:xyz\"");
        let back: SpotifyUri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
        assert!(serde_json::from_str::<SpotifyUri>("\"nope\"").is_err());
    }

    #[test]
    fn test_item_decodes_adjacently_tagged() {
        let json = serde_json::json!({"type": "artist", "data": artist_json()});
        let item: Item = serde_json::from_value(json).unwrap();
        assert_eq!(item.kind(), ItemKind::Artist);
        assert_eq!(item.name(), "Slowdive");
        assert_eq!(item.uri().to_string(), "spotify:artist:a1");
        assert_eq!(item.subtitle(), "shoegaze");
        assert!(item.artists().is_empty());
    }

    #[test]
    fn test_item_unknown_type_fails_to_decode() {
        let json = serde_json::json!({"type": "episode", "data": artist_json()});
        assert!(serde_json::from_value::<Item>(json).is_err());
    }

    #[test]
    fn test_typename_resolution() {
        assert_eq!(ItemKind::from_typename("Track").unwrap(), ItemKind::Track);
        assert_eq!(
            ItemKind::from_typename("AlbumSimplified").unwrap(),
            ItemKind::Album
        );
        let err = ItemKind::from_typename("Episode").unwrap_err();
        assert!(err.is_fatal());
    }
}
