//! Error types used throughout the client layer

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a credential renewal did not produce a new credential pair.
///
/// Every caller waiting on the same refresh cycle receives a clone of the
/// same value, so the type is cheap to clone and comparable.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum RefreshFailure {
    /// No refresh credential was stored when the refresh was requested.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The refresh endpoint answered with a non-success status.
    #[error("refresh endpoint rejected the credential (HTTP {status})")]
    Rejected { status: u16 },

    /// The refresh call never produced a response.
    #[error("refresh call failed: {0}")]
    Transport(String),

    /// The refresh endpoint answered 2xx with a payload we could not use.
    #[error("malformed refresh response: {0}")]
    InvalidResponse(String),

    /// The renewed pair could not be persisted.
    #[error("failed to persist refreshed tokens: {0}")]
    Storage(String),

    /// The refresh task ended without settling its waiters.
    #[error("refresh was interrupted before it settled")]
    Interrupted,
}

/// Main error type for Tollgate
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TollgateError {
    /// Connection, DNS, TLS or timeout failure from the transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered 401 on a first attempt.
    #[error("Authentication required")]
    AuthRequired,

    /// Credential renewal failed; the session has been terminated.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(RefreshFailure),

    /// The server answered 401 again after a successful refresh and replay.
    #[error("Authentication failed after token refresh")]
    RetryExhausted,

    /// The caller withdrew the request before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TollgateError {
    /// Whether this failure ended the session.
    #[must_use]
    pub const fn is_session_ending(&self) -> bool {
        matches!(self, Self::RefreshFailed(_))
    }

    /// Stable label suitable for structured logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::AuthRequired => "auth_required",
            Self::RefreshFailed(_) => "refresh_failed",
            Self::RetryExhausted => "retry_exhausted",
            Self::Cancelled => "cancelled",
            Self::Status { .. } => "status",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<RefreshFailure> for TollgateError {
    fn from(failure: RefreshFailure) -> Self {
        Self::RefreshFailed(failure)
    }
}

/// Result type alias for Tollgate operations
pub type Result<T> = std::result::Result<T, TollgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_failure_wraps_into_session_ending_error() {
        let err: TollgateError = RefreshFailure::Rejected { status: 400 }.into();
        assert!(err.is_session_ending());
        assert_eq!(err.to_string(), "Token refresh failed: refresh endpoint rejected the credential (HTTP 400)");
    }

    #[test]
    fn other_errors_do_not_end_the_session() {
        assert!(!TollgateError::RetryExhausted.is_session_ending());
        assert!(!TollgateError::Transport("reset".into()).is_session_ending());
        assert!(!TollgateError::Cancelled.is_session_ending());
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(TollgateError::AuthRequired.label(), "auth_required");
        assert_eq!(TollgateError::Status { status: 500, body: String::new() }.label(), "status");
        assert_eq!(TollgateError::RefreshFailed(RefreshFailure::Interrupted).label(), "refresh_failed");
    }

    #[test]
    fn errors_serialize_with_type_tag() {
        let json = serde_json::to_value(TollgateError::RefreshFailed(RefreshFailure::NoRefreshToken))
            .unwrap();
        assert_eq!(json["type"], "RefreshFailed");
        assert_eq!(json["message"]["kind"], "NoRefreshToken");
    }
}
