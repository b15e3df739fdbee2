//! Observability bootstrap
//!
//! The pipeline emits `tracing` events; this module installs the subscriber
//! that formats them.

pub mod logging;

pub use logging::{init_logging, LogFormat};
