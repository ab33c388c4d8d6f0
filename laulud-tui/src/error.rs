//! Error types for the TUI.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::persistence::PersistenceError;
use laulud_client::ApiClientError;
use laulud_core::LauludError;

#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ApiClientError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    /// A response the client cannot make sense of. Rendering carries on for
    /// every other error, these stop the application.
    #[error("Fatal API error: {0}")]
    Fatal(LauludError),
}
