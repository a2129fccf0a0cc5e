// CLI module for gemini-chat-relay
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use std::path::PathBuf;

/// gemini-chat-relay - Gemini chat relay with response caching and jailbreak screening
#[derive(Parser, Debug)]
#[command(name = "gemini-chat-relay", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.gemini-chat-relay/config.toml)
    #[arg(short, long, env = "CHAT_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut crate::config::AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
