//! # Tollgate Infrastructure
//!
//! Infrastructure implementations of the `tollgate-core` ports.
//!
//! This crate contains:
//! - reqwest transport and refresh endpoint client
//! - Credential stores (memory, JSON file, platform keychain)
//! - Configuration loading (environment and JSON/TOML files)
//! - Logging bootstrap
//! - [`connect`], which wires all of the above into an
//!   [`AuthenticatedClient`](tollgate_core::AuthenticatedClient)
//!
//! ## Architecture
//! - Implements traits defined in `tollgate-core`
//! - Contains all "impure" code (network, filesystem, keychain)

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod storage;
pub mod wiring;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, HttpTokenRefresher};
pub use observability::{init_logging, LogFormat};
pub use storage::{open_store, FileStore, KeychainStore, MemoryStore};
pub use wiring::{connect, connect_with_store};
