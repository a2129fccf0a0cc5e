//! Utility functions and helpers for the chat relay.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization with secret redaction.
//! - `retry`: Parsing of upstream retry hints.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;
