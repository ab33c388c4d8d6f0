//! Session check.

use laulud_core::LauludError;
use tracing::{info, warn};

use crate::transport::ApiTransport;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Checking,
    Authenticated,
    Unauthenticated,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated)
    }

    pub fn is_checking(&self) -> bool {
        matches!(self, AuthStatus::Checking)
    }
}

/// Ask the server whether the session is valid. A failed check counts as
/// logged out.
pub async fn check(transport: &dyn ApiTransport) -> AuthStatus {
    match transport.auth_check().await {
        Ok(true) => {
            info!("Session is valid");
            AuthStatus::Authenticated
        }
        Ok(false) => {
            info!("Session rejected");
            AuthStatus::Unauthenticated
        }
        Err(err) => {
            log_check_failure(&err);
            AuthStatus::Unauthenticated
        }
    }
}

fn log_check_failure(err: &LauludError) {
    warn!(error = %err, "Auth check failed");
}
