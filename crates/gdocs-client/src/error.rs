//! Remote error taxonomy

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the remote document and folder services
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Document or folder not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Rate limited by the remote service: {0}")]
    RateLimited(String),

    #[error("Transient remote failure: {0}")]
    Transient(String),

    /// A non-idempotent request may or may not have taken effect
    #[error("Outcome unknown, the request may have been applied: {0}")]
    Indeterminate(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Remote API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode remote response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to read upload artifact {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<RemoteError>,
    },
}

/// Result type for remote calls
pub type Result<T> = std::result::Result<T, RemoteError>;

impl RemoteError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::RateLimited(_) | RemoteError::Transient(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RemoteError::RateLimited(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }

    /// Reclassify a failure of a request that must not be repeated blindly.
    ///
    /// A server error or a dropped connection after sending leaves the outcome
    /// unknown, so it stops being retryable. Rejections such as rate limits
    /// are kept: the service did not act on the request.
    pub fn for_unsafe_request(self) -> Self {
        match self {
            RemoteError::Transient(message) => RemoteError::Indeterminate(message),
            other => other,
        }
    }

    /// Classify an HTTP error response.
    ///
    /// `reason` is the error reason reported by the service (e.g.
    /// `rateLimitExceeded`), used to tell quota 403s from permission 403s.
    pub fn from_status(status: u16, reason: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => RemoteError::Unauthenticated(message),
            403 if reason.is_some_and(is_rate_limit_reason) => RemoteError::RateLimited(message),
            403 => RemoteError::PermissionDenied(message),
            404 => RemoteError::NotFound(message),
            429 => RemoteError::RateLimited(message),
            500 | 502 | 503 | 504 => RemoteError::Transient(message),
            _ => RemoteError::Api { status, message },
        }
    }
}

fn is_rate_limit_reason(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    reason.contains("ratelimit")
        || reason.contains("rate_limit")
        || reason.contains("quota")
        || reason.contains("resource_exhausted")
}
