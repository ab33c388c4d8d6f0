//! Error types for Laulud operations.
//!
//! Every error here is `Clone + Eq` because query state (including its error)
//! is shared with any number of observers through watch channels.

use thiserror::Error;

/// Failures of the request/response exchange with the API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("GraphQL errors: {}", messages.join("; "))]
    Graphql { messages: Vec<String> },

    #[error("Failed to decode response: {reason}")]
    Decode { reason: String },
}

/// Input rejected before any request is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Tag must not be empty")]
    EmptyTag,

    #[error("Invalid Spotify URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Invalid route {path:?}: {reason}")]
    InvalidRoute { path: String, reason: String },
}

/// Master error type for all Laulud errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LauludError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("No data for {route}")]
    NotFound { route: String },

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Unknown item type: {item_type}")]
    UnknownItemType { item_type: String },

    #[error("Unexpected data for {route}: expected {expected}")]
    UnexpectedData { route: String, expected: String },

    #[error("Query for {key} was cancelled")]
    Cancelled { key: String },
}

impl LauludError {
    /// Map a non-success HTTP status onto the taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>, route: impl Into<String>) -> Self {
        match status {
            401 => LauludError::Unauthenticated,
            404 => LauludError::NotFound {
                route: route.into(),
            },
            _ => LauludError::Transport(TransportError::Status {
                status,
                message: message.into(),
            }),
        }
    }

    /// Schema mismatches between client and server. These indicate a
    /// programming error rather than a runtime condition, so the application
    /// stops instead of rendering them as a recoverable notification.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LauludError::UnknownItemType { .. }
                | LauludError::UnexpectedData { .. }
                | LauludError::Transport(TransportError::Decode { .. })
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LauludError::NotFound { .. })
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            LauludError::Unauthenticated
                | LauludError::Transport(TransportError::Status { status: 401, .. })
        )
    }
}

/// Result type alias for Laulud operations.
pub type LauludResult<T> = Result<T, LauludError>;

// =============================================================================
// TESTS
// =============================================================================
