//! Laulud Core - Domain Types
//!
//! Catalog items, tags, resource keys and the error taxonomy shared by every
//! other crate. No I/O happens here.

pub mod error;
pub mod item;
pub mod route;
pub mod tag;
pub mod user;

pub use error::{LauludError, LauludResult, TransportError, ValidationError};
pub use item::{
    AlbumSimplified, Artist, ArtistSimplified, ExternalUrls, Image, Item, ItemKind, SpotifyUri,
    Track,
};
pub use route::{encode_path, ApiData, ApiRoute};
pub use tag::{
    normalize_tag, CreateTagBody, ItemSearchResponse, TagDetails, TagSummary, TaggedItem,
};
pub use user::CurrentUser;

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
