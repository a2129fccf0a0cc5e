// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{RelayError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the binary)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest)
    ///
    /// An explicit `config_path` must exist; the default path is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path {
            Some(path) => File::from(path).required(true),
            None => File::from(Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            // Override with environment variables (e.g. CHAT_RELAY__GEMINI__API_KEY)
            .add_source(
                Environment::with_prefix("CHAT_RELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("safety.jailbreak_keywords")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        config.validate()
    }

    /// Normalizes the snapshot and rejects settings the service cannot run with.
    pub fn validate(mut self) -> Result<Self> {
        if self.gemini.api_key.trim().is_empty() {
            return Err(RelayError::Config(
                "gemini.api_key is required (set CHAT_RELAY__GEMINI__API_KEY)".to_string(),
            ));
        }

        if self.history.capacity == 0 {
            return Err(RelayError::Config(
                "history.capacity must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("gemini.timeout_seconds", self.gemini.timeout_seconds),
            ("cache.ttl_seconds", self.cache.ttl_seconds),
            ("cache.operation_timeout_seconds", self.cache.operation_timeout_seconds),
        ] {
            if value == 0 {
                return Err(RelayError::Config(format!("{} must be at least 1", name)));
            }
        }

        // A blank keyword would match every prompt.
        self.safety.jailbreak_keywords = self
            .safety
            .jailbreak_keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        Ok(self)
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gemini-chat-relay")
            .join("config.toml")
    }
}
