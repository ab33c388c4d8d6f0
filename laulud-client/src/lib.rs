//! Laulud Client - API Access
//!
//! Speaks to the Laulud API over REST or GraphQL, feeds responses into the
//! shared query cache and keeps every cached view of an item in step after a
//! tag mutation.

pub mod auth;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod graphql;
pub mod mutation;
pub mod rest;
pub mod transport;

use std::sync::Arc;

use laulud_cache::{CacheConfig, QueryObserver, QueryOptions};
use laulud_core::{ApiData, ApiRoute, LauludResult};
use tracing::info;

pub use auth::AuthStatus;
pub use config::{ClientConfig, TransportKind};
pub use error::ApiClientError;
pub use fetcher::{ApiFetcher, LauludCache};
pub use graphql::GraphqlClient;
pub use mutation::{MutationKind, MutationState, TagMutator};
pub use rest::{RestClient, SESSION_COOKIE_NAME};
pub use transport::ApiTransport;

/// Transport, cache and mutator wired together.
#[derive(Clone)]
pub struct LauludClient {
    transport: Arc<dyn ApiTransport>,
    cache: LauludCache,
    mutator: TagMutator,
}

impl LauludClient {
    /// Build the transport named by `config`.
    pub fn from_config(
        config: &ClientConfig,
        cache_config: CacheConfig,
    ) -> Result<Self, ApiClientError> {
        let transport: Arc<dyn ApiTransport> = match config.transport {
            TransportKind::Rest => Arc::new(RestClient::new(config)?),
            TransportKind::Graphql => Arc::new(GraphqlClient::new(config)?),
        };
        info!(
            base_url = config.base_url(),
            transport = %config.transport,
            "API client configured"
        );
        Ok(Self::new(transport, cache_config))
    }

    pub fn new(transport: Arc<dyn ApiTransport>, cache_config: CacheConfig) -> Self {
        let fetcher = Arc::new(ApiFetcher::new(Arc::clone(&transport)));
        let cache = LauludCache::new(fetcher, cache_config);
        let mutator = TagMutator::new(Arc::clone(&transport), cache.clone());
        Self {
            transport,
            cache,
            mutator,
        }
    }

    pub fn cache(&self) -> &LauludCache {
        &self.cache
    }

    pub fn transport(&self) -> &Arc<dyn ApiTransport> {
        &self.transport
    }

    pub fn tags(&self) -> &TagMutator {
        &self.mutator
    }

    pub fn observe(&self, route: ApiRoute, options: QueryOptions) -> QueryObserver<ApiRoute, ApiData> {
        self.cache.observe(route, options)
    }

    pub async fn auth_check(&self) -> AuthStatus {
        auth::check(self.transport.as_ref()).await
    }

    /// End the session and drop everything cached for it.
    pub async fn logout(&self) -> LauludResult<()> {
        self.transport.logout().await?;
        self.cache.clear();
        info!("Logged out");
        Ok(())
    }

    pub fn login_url(&self, next: &str) -> String {
        self.transport.login_url(next)
    }
}
