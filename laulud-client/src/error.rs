//! Transport-level errors and their mapping onto [`LauludError`].

use laulud_core::{LauludError, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("GraphQL errors: {}", .0.join("; "))]
    Graphql(Vec<String>),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl ApiClientError {
    /// Convert into the shared taxonomy. `route` names the resource for
    /// not-found errors.
    pub fn into_laulud(self, route: &str) -> LauludError {
        match self {
            ApiClientError::Http(err) => TransportError::Network {
                reason: err.to_string(),
            }
            .into(),
            ApiClientError::Timeout { timeout_ms } => TransportError::Timeout { timeout_ms }.into(),
            ApiClientError::Serde(err) => TransportError::Decode {
                reason: err.to_string(),
            }
            .into(),
            ApiClientError::Status { status, body } => LauludError::from_status(status, body, route),
            ApiClientError::Graphql(messages) => TransportError::Graphql { messages }.into(),
            ApiClientError::InvalidResponse(reason) => TransportError::Decode { reason }.into(),
            ApiClientError::Config(reason) => TransportError::Network { reason }.into(),
        }
    }
}

impl From<ApiClientError> for LauludError {
    fn from(err: ApiClientError) -> Self {
        err.into_laulud("")
    }
}
