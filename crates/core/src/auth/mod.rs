//! Bearer authentication with single-flight token refresh
//!
//! Every request leaving the client passes through this pipeline. When an
//! access token expires, many in-flight requests tend to receive 401 at the
//! same moment; the pipeline renews the credential exactly once, parks the
//! other callers until the renewal settles, and then replays each of them
//! once with the new token (or rejects all of them and ends the session).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ AuthenticatedClient  │  attach → send → guard
//! └──────────┬───────────┘
//!            │
//!            ├──► RequestAuthenticator   (Authorization: Bearer …)
//!            │
//!            └──► ResponseGuard          (401 → refresh → replay once)
//!                      │
//!                      └──► RefreshCoordinator   (Idle / Refreshing + waiters)
//!                                │
//!                                ├──► TokenRefresher      (port)
//!                                ├──► TokenStore          (KeyValueStore port)
//!                                └──► SessionTerminator   (clear + broadcast)
//! ```
//!
//! # Module Organization
//!
//! - **[`token_store`]**: credential pair snapshot plus durable persistence
//! - **[`authenticator`]**: stamps the bearer header
//! - **[`coordinator`]**: the single-flight refresh state machine
//! - **[`guard`]**: classifies responses and drives refresh-and-replay
//! - **[`terminator`]**: idempotent logout signal

pub mod authenticator;
pub mod coordinator;
pub mod guard;
pub mod terminator;
pub mod token_store;

pub use authenticator::RequestAuthenticator;
pub use coordinator::{RefreshCoordinator, RefreshState};
pub use guard::ResponseGuard;
pub use terminator::{SessionEnded, SessionTerminator};
pub use token_store::TokenStore;
