//! # Tollgate Domain
//!
//! Domain types shared by every Tollgate crate.
//!
//! This crate contains:
//! - Credential pair and HTTP request/response descriptors
//! - The error taxonomy and `Result` alias
//! - Client configuration structures
//! - Header names and storage keys
//!
//! ## Architecture
//! - No dependencies on other Tollgate crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
