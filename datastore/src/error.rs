//! Error types for store operations.

use crate::key::Key;
use std::fmt;

/// Store operations that can be failed on purpose through failpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// Upsert of one entity.
    Put,
    /// Lookup of one entity by key.
    Get,
    /// Query execution.
    GetAll,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreOp::Put => "put",
            StoreOp::Get => "get",
            StoreOp::GetAll => "get_all",
        })
    }
}

/// Errors returned by a [`Datastore`](crate::Datastore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A key's parent chain contains an incomplete key.
    #[error("key {key} has an incomplete parent; put the parent first")]
    IncompleteParent { key: Key },

    /// Lookup or ancestor scope on a key without a name or id.
    #[error("key {key} is incomplete")]
    IncompleteKey { key: Key },

    /// No entity stored at the key.
    #[error("no such entity: {key}")]
    NoSuchEntity { key: Key },

    /// Typed access with a key or query of a different kind.
    #[error("kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: String, found: String },

    /// Malformed encoded key.
    #[error("invalid key {encoded:?}: {reason}")]
    InvalidKey { encoded: String, reason: String },

    /// Entities must serialize to a property map.
    #[error("entity of kind {kind} did not serialize to a property map")]
    NotAPropertyMap { kind: String },

    /// Property encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend failure; the caller decides whether to retry.
    #[error("transient store failure during {op}: {reason}")]
    Transient { op: StoreOp, reason: String },
}

impl StoreError {
    /// Whether this failure came from the backend rather than the request.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::IncompleteParent {
            key: Key::incomplete("Location", Some(&Key::incomplete("Member", None))),
        };
        assert_eq!(
            err.to_string(),
            "key /Member,?/Location,? has an incomplete parent; put the parent first"
        );
    }

    #[test]
    fn test_transient() {
        let err = StoreError::Transient {
            op: StoreOp::Put,
            reason: "quota".to_string(),
        };
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "transient store failure during put: quota");
    }
}
