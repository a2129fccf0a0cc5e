//! Configuration data structures for the chat relay.
//!
//! This module defines the schema for the application settings: HTTP server
//! parameters, the upstream Gemini model, the response cache store, safety
//! screening, history retention and telemetry identity.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, CORS).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Response cache store settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Prompt screening settings.
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Conversation history retention.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Service identity reported by telemetry and `/health`.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8000`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to answer cross-origin requests from any origin.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

/// Settings for the upstream Gemini API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for the Generative Language API. Required.
    #[serde(default)]
    pub api_key: String,

    /// Model used for every completion.
    /// Default: `gemini-flash-latest`
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the Generative Language API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Upper bound on a single generation call, in seconds.
    /// Default: `60`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Which key-value store backs the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

/// Settings for the response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Store implementation.
    /// Default: `redis`
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,

    /// Full connection URL. Takes precedence over host/port/db when set.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Default: `localhost`
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    /// Default: `6379`
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Default: `0`
    #[serde(default)]
    pub redis_db: i64,

    /// Time-to-live of cached responses, in seconds.
    /// Default: `3600`
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Timeout applied to connecting and to each read/write, in seconds.
    /// Default: `5`
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_seconds: u64,
}

/// Settings for jailbreak screening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Phrases that cause a prompt to be refused (case-insensitive substring).
    /// Default: `["ignore"]`
    #[serde(default = "default_jailbreak_keywords")]
    pub jailbreak_keywords: Vec<String>,
}

/// Settings for in-memory conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of retained turns.
    /// Default: `50`
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

/// Telemetry identity of this deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Default: `gemini-chat-api`
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Default: `development`
    #[serde(default = "default_service_env")]
    pub env: String,

    /// Default: crate version
    #[serde(default = "default_service_version")]
    pub version: String,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: true,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            api_base_url: default_api_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: None,
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            redis_db: 0,
            ttl_seconds: default_ttl(),
            operation_timeout_seconds: default_operation_timeout(),
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            jailbreak_keywords: default_jailbreak_keywords(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            env: default_service_env(),
            version: default_service_version(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CacheConfig {
    /// Connection URL for the Redis store.
    pub fn connection_url(&self) -> String {
        match &self.redis_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!(
                "redis://{}:{}/{}",
                self.redis_host, self.redis_port, self.redis_db
            ),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gemini-flash-latest".to_string()
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Redis
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_ttl() -> u64 {
    3600 // 1 hour
}

fn default_operation_timeout() -> u64 {
    5
}

fn default_jailbreak_keywords() -> Vec<String> {
    vec!["ignore".to_string()]
}

fn default_history_capacity() -> usize {
    50
}

fn default_service_name() -> String {
    "gemini-chat-api".to_string()
}

fn default_service_env() -> String {
    "development".to_string()
}

fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
