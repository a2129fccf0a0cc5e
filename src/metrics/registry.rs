// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry, Counter, CounterVec,
    Encoder, Histogram, HistogramVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Chat requests by terminal outcome
    pub static ref CHAT_REQUESTS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("chat_requests_total", "Total chat requests by outcome"),
        &["outcome"], // outcome: blocked, cached, generated, rate_limited, failed
        REGISTRY
    ).unwrap();

    /// Chat request duration histogram
    pub static ref CHAT_REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("chat_request_duration_seconds", "Chat request duration in seconds")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["outcome"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Response cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total response cache operations"),
        &["operation"], // operation: hit, miss, error
        REGISTRY
    ).unwrap();

    /// Failed attempts to connect to the cache store
    pub static ref CACHE_CONNECTION_ERRORS: Counter = register_counter_with_registry!(
        Opts::new("cache_store_connection_errors_total", "Failed cache store connection attempts"),
        REGISTRY
    ).unwrap();

    // ============================================================================
    // SECURITY METRICS
    // ============================================================================

    /// Prompts refused by the jailbreak filter
    pub static ref JAILBREAK_ATTEMPTS: Counter = register_counter_with_registry!(
        Opts::new("security_jailbreak_attempts_total", "Prompts refused by the jailbreak filter"),
        REGISTRY
    ).unwrap();

    // ============================================================================
    // LLM METRICS
    // ============================================================================

    /// Upstream calls by status
    pub static ref LLM_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("llm_calls_total", "Total upstream generation calls"),
        &["model", "status"],
        REGISTRY
    ).unwrap();

    /// Upstream call duration
    pub static ref LLM_DURATION: Histogram = register_histogram_with_registry!(
        prometheus::HistogramOpts::new("llm_request_duration_seconds", "Upstream generation call duration")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        REGISTRY
    ).unwrap();

    /// Generation failures surfaced to callers
    pub static ref LLM_ERRORS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("llm_errors_total", "Generation failures by type"),
        &["type"], // type: rate_limit, internal
        REGISTRY
    ).unwrap();

    /// Tokens per generation
    pub static ref LLM_TOKENS: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("llm_tokens", "Tokens per generation")
            .buckets(prometheus::exponential_buckets(8.0, 2.0, 12).unwrap()),
        &["type"], // type: input, output, total
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
