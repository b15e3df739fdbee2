//! Bearer credential stamping

use std::sync::Arc;

use tollgate_domain::constants::{AUTHORIZATION_HEADER, BEARER_PREFIX};
use tollgate_domain::OutboundRequest;

use super::token_store::TokenStore;

/// Stamps outgoing requests with the current access credential.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    store: Arc<TokenStore>,
}

impl RequestAuthenticator {
    #[must_use]
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }

    /// Set `Authorization: Bearer <access>` when an access token is stored;
    /// otherwise return the request untouched.
    #[must_use]
    pub fn attach(&self, request: OutboundRequest) -> OutboundRequest {
        match self.store.access_token() {
            Some(token) => Self::attach_token(request, &token),
            None => request,
        }
    }

    /// Stamp an explicit access token, replacing any existing header.
    #[must_use]
    pub fn attach_token(request: OutboundRequest, token: &str) -> OutboundRequest {
        request.with_header(AUTHORIZATION_HEADER, format!("{BEARER_PREFIX}{token}"))
    }

    /// Access token a request was stamped with, if it carries a bearer
    /// header.
    #[must_use]
    pub fn bearer_token(request: &OutboundRequest) -> Option<&str> {
        request.authorization().and_then(|value| value.strip_prefix(BEARER_PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use tollgate_domain::TokenPair;

    use super::*;
    use crate::testing::MockKeyValueStore;

    #[tokio::test]
    async fn attaches_current_access_token() {
        let store = Arc::new(TokenStore::new(Arc::new(MockKeyValueStore::new())));
        store.set_tokens(TokenPair::new("A1", "R1")).await.unwrap();
        let authenticator = RequestAuthenticator::new(store);

        let request = authenticator.attach(OutboundRequest::get("https://api.test/orders"));

        assert_eq!(request.authorization(), Some("Bearer A1"));
        assert_eq!(RequestAuthenticator::bearer_token(&request), Some("A1"));
    }

    #[test]
    fn leaves_request_untouched_without_credentials() {
        let store = Arc::new(TokenStore::new(Arc::new(MockKeyValueStore::new())));
        let authenticator = RequestAuthenticator::new(store);
        let original = OutboundRequest::get("https://api.test/orders").with_header("X-Trace", "1");

        let request = authenticator.attach(original.clone());

        assert_eq!(request, original);
        assert_eq!(RequestAuthenticator::bearer_token(&request), None);
    }

    #[test]
    fn attach_token_replaces_stale_header() {
        let request = OutboundRequest::get("https://api.test")
            .with_header("authorization", "Bearer A1");

        let request = RequestAuthenticator::attach_token(request, "A2");

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.authorization(), Some("Bearer A2"));
    }
}
