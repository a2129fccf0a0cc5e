// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    CACHE_CONNECTION_ERRORS,
    CACHE_OPERATIONS,
    CHAT_REQUESTS,
    CHAT_REQUEST_DURATION,
    JAILBREAK_ATTEMPTS,
    LLM_CALLS,
    LLM_DURATION,
    LLM_ERRORS,
    LLM_TOKENS,
};

use crate::gemini::TokenUsage;

/// Helper to record a finished chat request
pub fn record_chat_request(outcome: &str, duration_secs: f64) {
    CHAT_REQUESTS.with_label_values(&[outcome]).inc();
    CHAT_REQUEST_DURATION
        .with_label_values(&[outcome])
        .observe(duration_secs);
}

/// Helper to record response cache operations
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_error() {
    CACHE_OPERATIONS.with_label_values(&["error"]).inc();
}

pub fn record_store_connection_error() {
    CACHE_CONNECTION_ERRORS.inc();
}

pub fn record_jailbreak_attempt() {
    JAILBREAK_ATTEMPTS.inc();
}

/// Helper to record an upstream generation call
pub fn record_llm_call(model: &str, status: &str, duration_secs: f64) {
    LLM_CALLS.with_label_values(&[model, status]).inc();
    LLM_DURATION.observe(duration_secs);
}

pub fn record_rate_limit_error() {
    LLM_ERRORS.with_label_values(&["rate_limit"]).inc();
}

pub fn record_internal_error() {
    LLM_ERRORS.with_label_values(&["internal"]).inc();
}

/// Helper to record token usage
pub fn record_tokens(usage: &TokenUsage) {
    LLM_TOKENS
        .with_label_values(&["input"])
        .observe(f64::from(usage.input));
    LLM_TOKENS
        .with_label_values(&["output"])
        .observe(f64::from(usage.output));
    LLM_TOKENS
        .with_label_values(&["total"])
        .observe(f64::from(usage.total));
}
