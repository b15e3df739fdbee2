//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `TOLLGATE_BASE_URL` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. The result is validated before it is returned
//!
//! ## Environment Variables
//! - `TOLLGATE_BASE_URL`: API base URL (required for env loading)
//! - `TOLLGATE_REFRESH_PATH`: Refresh endpoint path (default `/auth/refresh`)
//! - `TOLLGATE_REFRESH_MODE`: `body` or `cookie`
//! - `TOLLGATE_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `TOLLGATE_USER_AGENT`: User agent header
//! - `TOLLGATE_STORAGE`: `memory`, `file` or `keychain`
//! - `TOLLGATE_STORAGE_PATH`: Credential file path (required for `file`)
//! - `TOLLGATE_KEYCHAIN_SERVICE` / `TOLLGATE_KEYCHAIN_ACCOUNT`: Keychain
//!   entry naming
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./tollgate.json` or `./tollgate.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tollgate_domain::constants::{DEFAULT_KEYCHAIN_ACCOUNT, DEFAULT_KEYCHAIN_SERVICE};
use tollgate_domain::{ClientConfig, RefreshCredentialMode, Result, StorageConfig, TollgateError};

const BASE_URL_VAR: &str = "TOLLGATE_BASE_URL";

/// Load configuration with automatic fallback strategy
///
/// Environment variables win when `TOLLGATE_BASE_URL` is set; otherwise the
/// first probed config file is used.
///
/// # Errors
/// Returns `TollgateError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<ClientConfig> {
    let config = if std::env::var_os(BASE_URL_VAR).is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else {
        tracing::debug!("{BASE_URL_VAR} not set, trying config file");
        load_from_file(None)?
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only `TOLLGATE_BASE_URL` is required; everything else falls back to the
/// [`ClientConfig`] defaults.
///
/// # Errors
/// Returns `TollgateError::Config` if a required variable is missing or a
/// value does not parse.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new(env_var(BASE_URL_VAR)?);

    if let Some(path) = env_opt("TOLLGATE_REFRESH_PATH") {
        config.refresh_path = path;
    }
    if let Some(mode) = env_opt("TOLLGATE_REFRESH_MODE") {
        config.refresh_mode = RefreshCredentialMode::from_str(&mode)
            .map_err(TollgateError::Config)?;
    }
    if let Some(timeout) = env_opt("TOLLGATE_TIMEOUT_SECS") {
        config.timeout_secs = timeout
            .parse::<u64>()
            .map_err(|e| TollgateError::Config(format!("Invalid timeout: {e}")))?;
    }
    config.user_agent = env_opt("TOLLGATE_USER_AGENT");
    config.storage = storage_from_env()?;

    Ok(config)
}

fn storage_from_env() -> Result<StorageConfig> {
    let kind = env_opt("TOLLGATE_STORAGE").unwrap_or_else(|| "memory".to_string());

    match kind.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(StorageConfig::Memory),
        "file" => Ok(StorageConfig::File { path: PathBuf::from(env_var("TOLLGATE_STORAGE_PATH")?) }),
        "keychain" => Ok(StorageConfig::Keychain {
            service: env_opt("TOLLGATE_KEYCHAIN_SERVICE")
                .unwrap_or_else(|| DEFAULT_KEYCHAIN_SERVICE.to_string()),
            account: env_opt("TOLLGATE_KEYCHAIN_ACCOUNT")
                .unwrap_or_else(|| DEFAULT_KEYCHAIN_ACCOUNT.to_string()),
        }),
        other => Err(TollgateError::Config(format!("Unsupported storage kind: {other}"))),
    }
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `TollgateError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TollgateError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TollgateError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TollgateError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TollgateError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TollgateError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(TollgateError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
        candidates.extend(["../config.json", "../config.toml"].map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> [PathBuf; 4] {
    ["tollgate.json", "tollgate.toml", "config.json", "config.toml"].map(|name| dir.join(name))
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        TollgateError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional environment variable; blank values read as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
