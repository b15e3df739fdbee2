//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init_logging`] once at startup. Filter directives come from
//! `TOLLGATE_LOG`, then `RUST_LOG`, then default to `info`.

use tollgate_domain::{impl_keyword_conversions, Result, TollgateError};
use tracing_subscriber::EnvFilter;

/// Filter variable checked before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "TOLLGATE_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines with ANSI colours
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl_keyword_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

/// Initialise the global tracing subscriber.
///
/// # Errors
/// Returns `TollgateError::Config` if a filter directive does not parse or
/// a global subscriber is already installed
pub fn init_logging(format: LogFormat) -> Result<()> {
    let filter = filter_from_env()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    installed.map_err(|e| TollgateError::Config(format!("failed to set subscriber: {e}")))
}

fn filter_from_env() -> Result<EnvFilter> {
    let directives = [LOG_ENV_VAR, EnvFilter::DEFAULT_ENV]
        .into_iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));

    parse_filter(directives.as_deref().unwrap_or(DEFAULT_DIRECTIVE))
}

fn parse_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| TollgateError::Config(format!("invalid log filter '{directives}': {e}")))
}
