//! Adapter between a transport and the query cache.

use std::sync::Arc;

use async_trait::async_trait;
use laulud_cache::{QueryCache, QueryFetcher};
use laulud_core::{ApiData, ApiRoute, LauludResult};
use tracing::warn;

use crate::transport::ApiTransport;

/// The cache every view reads from.
pub type LauludCache = QueryCache<ApiRoute, ApiData>;

/// Resolves cache misses through an [`ApiTransport`], rejecting payloads that
/// do not match the requested key.
pub struct ApiFetcher {
    transport: Arc<dyn ApiTransport>,
}

impl ApiFetcher {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl QueryFetcher<ApiRoute, ApiData> for ApiFetcher {
    async fn fetch(&self, key: &ApiRoute) -> LauludResult<ApiData> {
        let data = self.transport.query(key).await?;
        key.check(data).map_err(|err| {
            warn!(route = %key, error = %err, "Response does not match route");
            err
        })
    }
}
