//! The seam between the client and the API.

use async_trait::async_trait;
use laulud_core::{ApiData, ApiRoute, LauludResult, SpotifyUri, TaggedItem};

/// Everything the client asks of the server. Implemented by the REST and
/// GraphQL clients and by in-memory fakes in tests.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Resolve a resource key. The returned variant must match the key.
    async fn query(&self, route: &ApiRoute) -> LauludResult<ApiData>;

    /// Add `tag` to the item and return the updated item. Adding an existing
    /// tag is a no-op on the server.
    async fn add_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem>;

    /// Remove `tag` from the item and return the updated item. Removing an
    /// absent tag is a no-op on the server.
    async fn delete_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem>;

    /// `Ok(true)` for a valid session, `Ok(false)` when the server rejects it.
    async fn auth_check(&self) -> LauludResult<bool>;

    async fn logout(&self) -> LauludResult<()>;

    /// Address that starts the OAuth flow in a browser, returning to `next`.
    fn login_url(&self, next: &str) -> String;
}
