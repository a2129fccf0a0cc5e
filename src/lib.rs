// gemini-chat-relay - Gemini chat relay with response caching and jailbreak screening
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod history;
pub mod metrics;
pub mod pipeline;
pub mod safety;
pub mod server;
pub mod traffic;
pub mod utils;
