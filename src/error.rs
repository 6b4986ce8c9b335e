//! vault-cache error types

use std::time::Duration;

use crate::types::ArtifactKind;

/// vault-cache error types
#[derive(Debug, thiserror::Error)]
pub enum VaultCacheError {
    // Remote store failures, propagated unchanged from the source
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("source error: {0}")]
    Source(String),

    /// The source call succeeded but produced nothing. No cache entry is
    /// created for the key.
    #[error("source returned no {kind} for '{key}'")]
    SourceReturnedEmpty { key: String, kind: ArtifactKind },

    /// The artifact held for `key` is not of the requested kind.
    ///
    /// Raised on cache hits when a caller asks for the wrong kind against an
    /// already-populated key. Never retried or coerced.
    #[error("'{key}' holds a {stored}, not a {expected}")]
    TypeMismatch {
        key: String,
        expected: ArtifactKind,
        stored: ArtifactKind,
    },

    /// Waiting for the key lock elapsed. Only returned under
    /// [`LockTimeoutPolicy::Fail`](crate::LockTimeoutPolicy::Fail).
    #[error("timed out after {waited:?} waiting for the lock on '{key}'")]
    LockTimeout { key: String, waited: Duration },

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VaultCacheError {
    /// Whether this error originated in the remote fetch source.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::AccessDenied(_)
                | Self::Http(_)
                | Self::Api { .. }
                | Self::Source(_)
        )
    }
}

/// Result type alias for vault-cache operations
pub type Result<T> = std::result::Result<T, VaultCacheError>;
