//! Structured logging and secret redaction.
//!
//! This module configures the `tracing` ecosystem for the relay, supporting
//! multiple output formats, and provides a filter that keeps Google API keys
//! out of log lines built from upstream URLs and error bodies.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::{RelayError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    /// Google API keys: `AIza` followed by 35 URL-safe characters.
    static ref API_KEY_PATTERN: Regex = Regex::new(r"AIza[0-9A-Za-z_\-]{35}").unwrap();

    /// `key=` query parameters on request URLs.
    static ref KEY_PARAM_PATTERN: Regex = Regex::new(r"([?&]key=)[^&\s]+").unwrap();
}

/// Initializes the global tracing subscriber for the application.
///
/// Supports three output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: Single-line human-readable output.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    // Configure filter from environment or config file
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| RelayError::Config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        "compact" => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    result.map_err(|e| RelayError::Internal(format!("Failed to install logger: {}", e)))
}

/// Redacts API keys from a string before it is logged.
pub fn sanitize(input: &str) -> String {
    let redacted = API_KEY_PATTERN.replace_all(input, "[REDACTED_API_KEY]");
    KEY_PARAM_PATTERN
        .replace_all(&redacted, "${1}[REDACTED]")
        .into_owned()
}
