//! Client constants
//!
//! Header names, storage keys and defaults shared by core and infra.

// Headers
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const BEARER_PREFIX: &str = "Bearer ";

// Durable storage
/// Key under which the credential pair is persisted as one JSON document.
pub const CREDENTIALS_KEY: &str = "session.credentials";

// Defaults
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "tollgate";
pub const DEFAULT_KEYCHAIN_ACCOUNT: &str = "default";

// Signals
/// Capacity of the session-ended broadcast channel. The signal carries no
/// payload, so lagging subscribers lose nothing but duplicates.
pub const SESSION_SIGNAL_CAPACITY: usize = 16;
