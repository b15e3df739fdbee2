//! # Tollgate Core
//!
//! Authentication pipeline for outgoing API calls - no I/O of its own.
//!
//! This crate contains:
//! - Port interfaces (traits) for storage, transport and credential renewal
//! - The auth pipeline: token store, request authenticator, single-flight
//!   refresh coordinator, response guard and session terminator
//! - [`AuthenticatedClient`], the facade callers issue requests through
//!
//! ## Architecture Principles
//! - Only depends on `tollgate-domain`
//! - No HTTP, keychain or filesystem code
//! - All external dependencies via traits in [`ports`]

pub mod auth;
pub mod client;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use auth::{
    RefreshCoordinator, RefreshState, RequestAuthenticator, ResponseGuard, SessionEnded,
    SessionTerminator, TokenStore,
};
pub use client::AuthenticatedClient;
pub use ports::{HttpTransport, KeyValueStore, TokenRefresher};
