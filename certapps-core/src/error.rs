//! Error types for application services.

use datastore::StoreError;
use thiserror::Error;

/// Errors from services and request handlers.
///
/// Every variant aborts the current request; nothing is retried.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Parsing json from body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("identity provider error: {reason}")]
    Identity { reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl AppError {
    /// Build an [`AppError::InvalidRequest`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        AppError::InvalidRequest {
            reason: reason.into(),
        }
    }
}

/// Result type for application operations.
pub type AppResult<T> = std::result::Result<T, AppError>;
