//! reqwest transport and refresh endpoint client

pub mod client;
pub mod refresher;

pub use client::{HttpClient, HttpClientBuilder};
pub use refresher::HttpTokenRefresher;
