use printdesk_common::error::PrintdeskError;
use printdesk_marketplace::SpApiError;
use thiserror::Error;

/// Failures that end a pipeline run (or an alert check).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("marketplace authentication failed: {0}")]
    Auth(String),

    #[error("marketplace fetch failed: {0}")]
    TransientFetch(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("a {0} sync is already running")]
    AlreadyRunning(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<SpApiError> for SyncError {
    fn from(err: SpApiError) -> Self {
        match err {
            SpApiError::Auth { .. } => Self::Auth(err.to_string()),
            other => Self::TransientFetch(other.to_string()),
        }
    }
}

impl From<PrintdeskError> for SyncError {
    fn from(err: PrintdeskError) -> Self {
        match err {
            PrintdeskError::Config(_) | PrintdeskError::MissingConfig(_) => {
                Self::Configuration(err.to_string())
            }
            PrintdeskError::Database(_) => Self::Persistence(err.to_string()),
            other => Self::Unexpected(other.to_string()),
        }
    }
}
