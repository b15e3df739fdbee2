//! Refresh endpoint client

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tollgate_core::TokenRefresher;
use tollgate_domain::{ClientConfig, RefreshCredentialMode, RefreshFailure, TokenPair};
use tracing::{debug, instrument, warn};

use super::client::HttpClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl RefreshResponse {
    fn into_pair(self) -> TokenPair {
        let pair = TokenPair::new(self.access_token, self.refresh_token.unwrap_or_default());
        match self.expires_in {
            Some(seconds) => pair.with_expires_in(seconds),
            None => pair,
        }
    }
}

/// [`TokenRefresher`] that POSTs to the configured refresh endpoint.
///
/// In body mode the stored refresh token is sent as
/// `{"refreshToken": ...}`. In cookie mode the body is empty and the shared
/// cookie jar of the [`HttpClient`] carries the credential.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    http: HttpClient,
    url: String,
    mode: RefreshCredentialMode,
}

impl HttpTokenRefresher {
    #[must_use]
    pub fn new(http: HttpClient, url: impl Into<String>, mode: RefreshCredentialMode) -> Self {
        Self { http, url: url.into(), mode }
    }

    /// Refresher for `config`, sharing `http` (and its cookie jar) with the
    /// request transport.
    #[must_use]
    pub fn from_config(http: HttpClient, config: &ClientConfig) -> Self {
        Self::new(http, config.refresh_url(), config.refresh_mode)
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    #[instrument(skip_all, fields(url = %self.url, mode = %self.mode))]
    async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, RefreshFailure> {
        let mut builder = self.http.request(Method::POST, &self.url);
        builder = match (self.mode, refresh_token) {
            (RefreshCredentialMode::Body, Some(token)) => {
                builder.json(&RefreshRequest { refresh_token: token })
            }
            (RefreshCredentialMode::Body, None) => return Err(RefreshFailure::NoRefreshToken),
            (RefreshCredentialMode::Cookie, _) => builder,
        };

        let response =
            self.http.execute(builder).await.map_err(|e| RefreshFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Refresh endpoint rejected the credential");
            return Err(RefreshFailure::Rejected { status: status.as_u16() });
        }

        let payload: RefreshResponse = response
            .json()
            .await
            .map_err(|e| RefreshFailure::InvalidResponse(e.to_string()))?;
        if payload.access_token.is_empty() {
            return Err(RefreshFailure::InvalidResponse("empty access token".to_string()));
        }

        let rotated = payload.refresh_token.is_some();
        let pair = payload.into_pair();
        debug!(
            rotated,
            expires_in = pair.seconds_until_expiry(),
            "Refresh endpoint issued new credentials"
        );
        Ok(pair)
    }

    fn requires_stored_token(&self) -> bool {
        self.mode == RefreshCredentialMode::Body
    }
}
