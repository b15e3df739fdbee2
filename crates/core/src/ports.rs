//! Port interfaces consumed by the auth pipeline
//!
//! These traits define the boundaries between the pipeline and the
//! infrastructure that stores credentials and talks to the network.

use async_trait::async_trait;
use tollgate_domain::{InboundResponse, OutboundRequest, RefreshFailure, Result, TokenPair};

/// Durable string key-value storage backing the token store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, or `None` when absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Sends one request attempt over the network
///
/// Any HTTP status, including 401 and 5xx, is a successful send and comes
/// back as `Ok`. `Err` is reserved for failures that produced no response
/// (connection, timeout, TLS). Dropping the returned future aborts the
/// request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<InboundResponse>;
}

/// Calls the credential renewal endpoint
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange the refresh credential for a new pair.
    ///
    /// `refresh_token` is the stored refresh credential; it is `None` when
    /// the credential travels out of band (cookie).
    async fn refresh(
        &self,
        refresh_token: Option<&str>,
    ) -> std::result::Result<TokenPair, RefreshFailure>;

    /// Whether a stored refresh token is required to attempt renewal. When
    /// true, a missing token fails fast without a network call.
    fn requires_stored_token(&self) -> bool {
        true
    }
}
