//! Client configuration structures

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KEYCHAIN_ACCOUNT, DEFAULT_KEYCHAIN_SERVICE, DEFAULT_REFRESH_PATH, DEFAULT_TIMEOUT_SECS,
};
use crate::errors::{Result, TollgateError};
use crate::impl_keyword_conversions;

/// Where the refresh credential travels on the refresh call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshCredentialMode {
    /// `{"refreshToken": ...}` JSON body, token read from the store.
    #[default]
    Body,
    /// Empty body; an HTTP-only cookie set by the server carries it.
    Cookie,
}

impl_keyword_conversions!(RefreshCredentialMode {
    Body => "body",
    Cookie => "cookie",
});

/// Durable key-value backend for the token store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process-lifetime only.
    #[default]
    Memory,
    /// JSON document on disk.
    File { path: PathBuf },
    /// Platform keychain entry per key.
    Keychain {
        #[serde(default = "default_keychain_service")]
        service: String,
        #[serde(default = "default_keychain_account")]
        account: String,
    },
}

/// Configuration for an authenticated client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every relative path is joined onto (e.g.
    /// "https://api.example.com/v1")
    pub base_url: String,

    /// Path of the refresh endpoint, relative to `base_url`
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    #[serde(default)]
    pub refresh_mode: RefreshCredentialMode,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_path: default_refresh_path(),
            refresh_mode: RefreshCredentialMode::default(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            storage: StorageConfig::default(),
        }
    }

    /// Absolute URL for `path`.
    ///
    /// Absolute `http(s)://` inputs are returned unchanged.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    #[must_use]
    pub fn refresh_url(&self) -> String {
        self.endpoint(&self.refresh_path)
    }

    /// Check the configuration before any client is built from it.
    ///
    /// # Errors
    /// Returns `TollgateError::Config` for a base URL that is not an
    /// absolute http(s) URL, a relative refresh path without a leading
    /// `/`, or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| TollgateError::Config(format!("Invalid base URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TollgateError::Config(format!(
                "Unsupported base URL scheme: {}",
                parsed.scheme()
            )));
        }
        let absolute_refresh =
            self.refresh_path.starts_with("http://") || self.refresh_path.starts_with("https://");
        if !absolute_refresh && !self.refresh_path.starts_with('/') {
            return Err(TollgateError::Config(format!(
                "Refresh path must start with '/': {}",
                self.refresh_path
            )));
        }
        if self.timeout_secs == 0 {
            return Err(TollgateError::Config("Timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_keychain_service() -> String {
    DEFAULT_KEYCHAIN_SERVICE.to_string()
}

fn default_keychain_account() -> String {
    DEFAULT_KEYCHAIN_ACCOUNT.to_string()
}
