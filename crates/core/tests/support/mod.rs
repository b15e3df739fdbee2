//! Shared test helpers for `tollgate-core` integration tests.
//!
//! Builds an [`AuthenticatedClient`] over the scripted doubles in
//! `tollgate_core::testing` so each test only states its scenario.

#![allow(dead_code)]

use std::sync::Arc;

use tollgate_core::testing::{MockKeyValueStore, MockRefresher, MockTransport};
use tollgate_core::{AuthenticatedClient, TokenStore};
use tollgate_domain::{ClientConfig, TokenPair};

pub const BASE_URL: &str = "https://api.test";

pub struct Fixture {
    pub client: Arc<AuthenticatedClient>,
    pub backend: Arc<MockKeyValueStore>,
    pub refresher: Arc<MockRefresher>,
    pub transport: Arc<MockTransport>,
}

pub async fn signed_in(
    pair: TokenPair,
    refresher: MockRefresher,
    transport: MockTransport,
) -> Fixture {
    let backend = Arc::new(MockKeyValueStore::new());
    let store = Arc::new(TokenStore::new(backend.clone()));
    let refresher = Arc::new(refresher);
    let transport = Arc::new(transport);

    let client = AuthenticatedClient::new(
        ClientConfig::new(BASE_URL),
        store,
        transport.clone(),
        refresher.clone(),
    );
    client.sign_in(pair).await.expect("sign in");

    Fixture { client: Arc::new(client), backend, refresher, transport }
}
