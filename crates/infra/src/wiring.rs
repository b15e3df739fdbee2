//! Assembly of a ready-to-use client from configuration

use std::sync::Arc;

use tollgate_core::{AuthenticatedClient, KeyValueStore, TokenStore};
use tollgate_domain::{ClientConfig, Result};
use tracing::info;

use crate::http::{HttpClient, HttpTokenRefresher};
use crate::storage::open_store;

/// Build an [`AuthenticatedClient`] for `config`.
///
/// Validates the configuration, opens the configured credential store,
/// restores any persisted session and shares one reqwest client (and cookie
/// jar) between request transport and refresh calls.
///
/// # Errors
/// Returns `TollgateError::Config` for an invalid configuration, or the
/// storage error if the persisted session cannot be read
pub async fn connect(config: &ClientConfig) -> Result<AuthenticatedClient> {
    connect_with_store(config, open_store(&config.storage)).await
}

/// [`connect`] with an explicit credential backend.
///
/// # Errors
/// As [`connect`]
pub async fn connect_with_store(
    config: &ClientConfig,
    backend: Arc<dyn KeyValueStore>,
) -> Result<AuthenticatedClient> {
    config.validate()?;

    let store = Arc::new(TokenStore::new(backend));
    let restored = store.load().await?;

    let http = HttpClient::from_config(config)?;
    let refresher = HttpTokenRefresher::from_config(http.clone(), config);

    info!(base_url = %config.base_url, mode = %config.refresh_mode, restored, "Client ready");
    Ok(AuthenticatedClient::new(config.clone(), store, Arc::new(http), Arc::new(refresher)))
}
