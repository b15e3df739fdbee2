//! Test doubles for the auth pipeline
//!
//! Available to this crate's unit tests and, through the `test-utils`
//! feature, to integration tests, benches and downstream crates:
//! - **[`mocks`]**: scripted store, transport and refresher
//! - [`token_store_with`] / [`wait_until`]: setup and synchronization helpers

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::expect_used)]

pub mod mocks;

use std::sync::Arc;
use std::time::Duration;

pub use mocks::{MockKeyValueStore, MockRefresher, MockTransport};
use tollgate_domain::TokenPair;

use crate::auth::TokenStore;

/// Token store over a fresh [`MockKeyValueStore`], optionally signed in.
pub async fn token_store_with(pair: Option<TokenPair>) -> Arc<TokenStore> {
    let store = Arc::new(TokenStore::new(Arc::new(MockKeyValueStore::new())));
    if let Some(pair) = pair {
        store.set_tokens(pair).await.expect("mock store accepts writes");
    }
    store
}

/// Yield to other tasks until `condition` holds. Panics after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached within 5s");
}
