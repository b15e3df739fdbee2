//! Response classification and refresh-and-replay

use std::sync::Arc;

use tollgate_domain::{InboundResponse, OutboundRequest, Result, TollgateError};
use tracing::{debug, warn};

use super::authenticator::RequestAuthenticator;
use super::coordinator::RefreshCoordinator;
use crate::ports::HttpTransport;

/// Decides what happens to a failed attempt.
///
/// Only the first 401 of a logical request is handled here: the credential
/// is renewed through the [`RefreshCoordinator`] and the request is replayed
/// once. Every other failure surfaces to the caller unchanged.
#[derive(Clone)]
pub struct ResponseGuard {
    coordinator: RefreshCoordinator,
    transport: Arc<dyn HttpTransport>,
}

impl ResponseGuard {
    #[must_use]
    pub fn new(coordinator: RefreshCoordinator, transport: Arc<dyn HttpTransport>) -> Self {
        Self { coordinator, transport }
    }

    /// Map a transport result to the caller-facing result.
    ///
    /// Statuses below 400 are returned as-is; 401 becomes
    /// [`TollgateError::AuthRequired`]; any other error status becomes
    /// [`TollgateError::Status`] carrying the body text.
    ///
    /// # Errors
    /// See above; transport errors pass through untouched
    pub fn classify(outcome: Result<InboundResponse>) -> Result<InboundResponse> {
        let response = outcome?;
        match response.status {
            status if status < 400 => Ok(response),
            401 => Err(TollgateError::AuthRequired),
            status => Err(TollgateError::Status { status, body: response.text() }),
        }
    }

    /// Handle a failed first attempt of `request`.
    ///
    /// # Errors
    /// - `TollgateError::RefreshFailed` when renewal fails (the session has
    ///   ended by then)
    /// - `TollgateError::RetryExhausted` when `request` is already a replay,
    ///   or its replay is rejected again
    /// - Any error other than `AuthRequired` is returned unchanged
    pub async fn recover(
        &self,
        request: &OutboundRequest,
        error: TollgateError,
    ) -> Result<InboundResponse> {
        if !matches!(error, TollgateError::AuthRequired) {
            return Err(error);
        }
        if request.is_retry() {
            warn!(
                request_id = %request.id,
                kind = TollgateError::RetryExhausted.label(),
                "Replay rejected; not refreshing again"
            );
            return Err(TollgateError::RetryExhausted);
        }

        let replay = request.retry_attempt();
        let renewed = match RequestAuthenticator::bearer_token(request) {
            Some(rejected) => self.coordinator.renew_after_rejection(rejected).await,
            None => self.coordinator.request_refresh().await,
        };
        let token = match renewed {
            Ok(token) => token,
            Err(failure) => {
                let error = TollgateError::from(failure);
                warn!(
                    request_id = %request.id,
                    kind = error.label(),
                    %error,
                    "Credential not renewed"
                );
                return Err(error);
            }
        };

        let replay = RequestAuthenticator::attach_token(replay, &token);
        debug!(request_id = %replay.id, "Replaying request with renewed credential");

        match Self::classify(self.transport.send(&replay).await) {
            Err(TollgateError::AuthRequired) => {
                warn!(request_id = %replay.id, "Replay rejected after refresh");
                Err(TollgateError::RetryExhausted)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for ResponseGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseGuard").field("coordinator", &self.coordinator).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use tollgate_domain::{RefreshFailure, TokenPair};

    use super::*;
    use crate::auth::SessionTerminator;
    use crate::testing::{token_store_with, MockRefresher, MockTransport};

    async fn guard_with(
        pair: TokenPair,
        refresher: MockRefresher,
        transport: MockTransport,
    ) -> (ResponseGuard, Arc<MockRefresher>, Arc<MockTransport>) {
        let store = token_store_with(Some(pair)).await;
        let refresher = Arc::new(refresher);
        let transport = Arc::new(transport);
        let terminator = Arc::new(SessionTerminator::new(store.clone()));
        let coordinator = RefreshCoordinator::new(store, refresher.clone(), terminator);
        (ResponseGuard::new(coordinator, transport.clone()), refresher, transport)
    }

    #[test]
    fn classify_maps_statuses() {
        assert!(ResponseGuard::classify(Ok(InboundResponse::new(204))).is_ok());
        assert!(ResponseGuard::classify(Ok(InboundResponse::new(304))).is_ok());
        assert_eq!(
            ResponseGuard::classify(Ok(InboundResponse::new(401))),
            Err(TollgateError::AuthRequired)
        );
        assert_eq!(
            ResponseGuard::classify(Ok(InboundResponse::new(503).with_body("down"))),
            Err(TollgateError::Status { status: 503, body: "down".into() })
        );
        assert_eq!(
            ResponseGuard::classify(Err(TollgateError::Transport("reset".into()))),
            Err(TollgateError::Transport("reset".into()))
        );
    }

    #[tokio::test]
    async fn first_rejection_refreshes_and_replays_once() {
        let (guard, refresher, transport) = guard_with(
            TokenPair::new("A1", "R1"),
            MockRefresher::succeeding(TokenPair::new("A2", "R2")),
            MockTransport::accepting("A2"),
        )
        .await;
        let request = RequestAuthenticator::attach_token(OutboundRequest::get("https://api.test/x"), "A1");

        let response = guard.recover(&request, TollgateError::AuthRequired).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(refresher.calls(), 1);
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_retry());
        assert_eq!(sent[0].id, request.id);
        assert_eq!(sent[0].authorization(), Some("Bearer A2"));
        assert!(!request.is_retry());
    }

    #[tokio::test]
    async fn replayed_request_never_refreshes_again() {
        let (guard, refresher, transport) = guard_with(
            TokenPair::new("A1", "R1"),
            MockRefresher::succeeding(TokenPair::new("A2", "R2")),
            MockTransport::always(401),
        )
        .await;
        let replay = OutboundRequest::get("https://api.test/x").retry_attempt();

        let result = guard.recover(&replay, TollgateError::AuthRequired).await;

        assert_eq!(result, Err(TollgateError::RetryExhausted));
        assert_eq!(refresher.calls(), 0);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn second_rejection_after_refresh_is_retry_exhausted() {
        let (guard, refresher, transport) = guard_with(
            TokenPair::new("A1", "R1"),
            MockRefresher::succeeding(TokenPair::new("A2", "R2")),
            MockTransport::always(401),
        )
        .await;
        let request = RequestAuthenticator::attach_token(OutboundRequest::get("https://api.test/x"), "A1");

        let result = guard.recover(&request, TollgateError::AuthRequired).await;

        assert_eq!(result, Err(TollgateError::RetryExhausted));
        assert_eq!(refresher.calls(), 1);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn refresh_failure_replaces_the_original_rejection() {
        let failure = RefreshFailure::Rejected { status: 400 };
        let (guard, _, transport) = guard_with(
            TokenPair::new("A1", "R1"),
            MockRefresher::failing(failure.clone()),
            MockTransport::accepting("A2"),
        )
        .await;
        let request = RequestAuthenticator::attach_token(OutboundRequest::get("https://api.test/x"), "A1");

        let result = guard.recover(&request, TollgateError::AuthRequired).await;

        assert_eq!(result, Err(TollgateError::RefreshFailed(failure)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn other_errors_pass_through() {
        let (guard, refresher, _) = guard_with(
            TokenPair::new("A1", "R1"),
            MockRefresher::succeeding(TokenPair::new("A2", "R2")),
            MockTransport::accepting("A2"),
        )
        .await;
        let request = OutboundRequest::get("https://api.test/x");

        let forbidden = TollgateError::Status { status: 403, body: String::new() };
        assert_eq!(guard.recover(&request, forbidden.clone()).await, Err(forbidden));

        let transport = TollgateError::Transport("timed out".into());
        assert_eq!(guard.recover(&request, transport.clone()).await, Err(transport));
        assert_eq!(refresher.calls(), 0);
    }
}
