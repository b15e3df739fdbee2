//! Authenticated client facade
//!
//! The single entry point feature code issues requests through. Each call
//! runs the pipeline: attach the bearer credential, send, classify, and on a
//! first 401 refresh-and-replay through the [`ResponseGuard`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tollgate_domain::{
    ClientConfig, HttpMethod, InboundResponse, OutboundRequest, Result, TokenPair, TollgateError,
};
use tracing::{debug, info, instrument};

use crate::auth::{
    RefreshCoordinator, RequestAuthenticator, ResponseGuard, SessionEnded, SessionTerminator,
    TokenStore,
};
use crate::ports::{HttpTransport, TokenRefresher};

/// HTTP client that keeps a bearer session alive.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use tollgate_core::{AuthenticatedClient, HttpTransport, TokenRefresher, TokenStore};
/// use tollgate_domain::{ClientConfig, TokenPair};
///
/// # async fn example(
/// #     store: Arc<TokenStore>,
/// #     transport: Arc<dyn HttpTransport>,
/// #     refresher: Arc<dyn TokenRefresher>,
/// # ) -> tollgate_domain::Result<()> {
/// let client = AuthenticatedClient::new(
///     ClientConfig::new("https://api.example.com"),
///     store,
///     transport,
///     refresher,
/// );
/// client.sign_in(TokenPair::new("access", "refresh")).await?;
///
/// let orders: serde_json::Value = client.get_json("/orders").await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthenticatedClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    store: Arc<TokenStore>,
    authenticator: RequestAuthenticator,
    coordinator: RefreshCoordinator,
    guard: ResponseGuard,
    terminator: Arc<SessionTerminator>,
}

impl AuthenticatedClient {
    /// Wire the pipeline around an already hydrated `store`.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        store: Arc<TokenStore>,
        transport: Arc<dyn HttpTransport>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        let terminator = Arc::new(SessionTerminator::new(store.clone()));
        let coordinator = RefreshCoordinator::new(store.clone(), refresher, terminator.clone());
        let guard = ResponseGuard::new(coordinator.clone(), transport.clone());
        let authenticator = RequestAuthenticator::new(store.clone());

        Self { config, transport, store, authenticator, coordinator, guard, terminator }
    }

    /// Request descriptor for `path` joined onto the configured base URL.
    #[must_use]
    pub fn request(&self, method: HttpMethod, path: &str) -> OutboundRequest {
        OutboundRequest::new(method, self.config.endpoint(path))
    }

    /// Send `request` through the pipeline.
    ///
    /// # Errors
    /// - `Transport` when no response arrived
    /// - `RefreshFailed` when the credential could not be renewed; the
    ///   session has ended
    /// - `RetryExhausted` when the replay was rejected again
    /// - `Status` for any other non-success status
    #[instrument(
        skip(self, request),
        fields(request_id = %request.id, method = %request.method, url = %request.url)
    )]
    pub async fn execute(&self, request: OutboundRequest) -> Result<InboundResponse> {
        let request = self.authenticator.attach(request);
        debug!("Sending request");

        match ResponseGuard::classify(self.transport.send(&request).await) {
            Ok(response) => Ok(response),
            Err(error) => self.guard.recover(&request, error).await,
        }
    }

    /// [`AuthenticatedClient::execute`], abandoned as soon as `cancel` fires.
    ///
    /// Withdrawing while parked on a refresh removes only this caller's
    /// waiter; the refresh itself continues for everyone else.
    ///
    /// # Errors
    /// `TollgateError::Cancelled` when `cancel` fires first, otherwise as
    /// [`AuthenticatedClient::execute`]
    pub async fn execute_with_cancel(
        &self,
        request: OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<InboundResponse> {
        let request_id = request.id;
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(%request_id, "Request cancelled by caller");
                Err(TollgateError::Cancelled)
            }
            result = self.execute(request) => result,
        }
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    /// As [`AuthenticatedClient::execute`], plus `InvalidInput` when the
    /// body does not decode into `T`
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.request(HttpMethod::Get, path)).await?.json()
    }

    /// POST `body` as JSON to `path` and decode the response.
    ///
    /// # Errors
    /// As [`AuthenticatedClient::get_json`]
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(HttpMethod::Post, path).with_json(body)?;
        self.execute(request).await?.json()
    }

    /// PUT `body` as JSON to `path` and decode the response.
    ///
    /// # Errors
    /// As [`AuthenticatedClient::get_json`]
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(HttpMethod::Put, path).with_json(body)?;
        self.execute(request).await?.json()
    }

    /// DELETE `path`, discarding the body.
    ///
    /// # Errors
    /// As [`AuthenticatedClient::execute`]
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.request(HttpMethod::Delete, path)).await.map(|_| ())
    }

    /// Store a freshly issued credential pair and start a new session.
    ///
    /// # Errors
    /// Returns error if the pair cannot be persisted
    #[instrument(skip_all)]
    pub async fn sign_in(&self, pair: TokenPair) -> Result<()> {
        self.store.set_tokens(pair).await?;
        self.terminator.rearm();
        info!("Signed in");
        Ok(())
    }

    /// End the session: clear credentials and emit [`SessionEnded`].
    ///
    /// # Returns
    /// `false` if the session had already ended
    #[instrument(skip_all)]
    pub async fn sign_out(&self) -> bool {
        self.terminator.terminate().await
    }

    /// Receiver for the forced-logout signal.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEnded> {
        self.terminator.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    #[must_use]
    pub const fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("base_url", &self.config.base_url)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}
