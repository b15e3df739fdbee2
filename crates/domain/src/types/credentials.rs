//! Credential pair held by the token store

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access and refresh credentials issued together.
///
/// Both tokens are opaque. An empty refresh token is treated the same as a
/// missing one. `Debug` output never includes the token values.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiry of the access token, when the issuer told us.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    /// Create a pair without expiry information.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        let refresh_token = refresh_token.into();
        Self {
            access_token: access_token.into(),
            refresh_token: (!refresh_token.is_empty()).then_some(refresh_token),
            expires_at: None,
        }
    }

    /// Create a pair that carries only an access credential.
    #[must_use]
    pub fn access_only(access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: None, expires_at: None }
    }

    /// Set the expiry relative to now.
    ///
    /// Non-positive lifetimes, and lifetimes too large to represent as a
    /// timestamp, leave the pair without expiry information.
    #[must_use]
    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_at = Some(seconds)
            .filter(|seconds| *seconds > 0)
            .and_then(chrono::Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        self
    }

    /// Access credential, if non-empty.
    #[must_use]
    pub fn access(&self) -> Option<&str> {
        Some(self.access_token.as_str()).filter(|token| !token.is_empty())
    }

    /// Refresh credential, if present and non-empty.
    #[must_use]
    pub fn refresh(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Keep `previous` refresh credential when this pair was issued without
    /// one (cookie-based refresh endpoints usually omit it).
    #[must_use]
    pub fn or_refresh_from(mut self, previous: Option<&str>) -> Self {
        if self.refresh().is_none() {
            self.refresh_token = previous.map(str::to_string);
        }
        self
    }

    /// Seconds until expiry, or `None` when no expiry is known.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh().is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
