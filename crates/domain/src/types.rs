//! Data types shared across the client pipeline

pub mod credentials;
pub mod http;

pub use credentials::TokenPair;
pub use http::{HttpMethod, InboundResponse, OutboundRequest};
