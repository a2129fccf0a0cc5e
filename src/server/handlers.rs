// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::cache::CacheStats;
use crate::config::CacheBackend;
use crate::error::RelayError;
use crate::history::ChatTurn;
use crate::pipeline::{ChatRequest, ChatResponse};
use crate::traffic::{self, TrafficParams};
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub env: String,
    pub cache_store: StoreHealth,
    pub cache: CacheStats,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreHealth {
    pub backend: CacheBackend,
    pub connected: bool,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrafficStarted {
    pub status: String,
    pub message: String,
    pub num_requests: u32,
    pub delay_seconds: u64,
}

/// Handler for `POST /chat`
///
/// Malformed bodies are reported as [`RelayError::InvalidRequest`].
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, RelayError> {
    let req: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!("Rejected /chat body: {}", e);
        RelayError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })?;
    let reply = state.pipeline.submit(&req.prompt, &req.user_id).await?;
    Ok(Json(ChatResponse { response: reply.text }))
}

/// Handler for `GET /history`, oldest turn first
pub async fn history_handler(State(state): State<AppState>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        messages: state.pipeline.history().snapshot(),
    })
}

/// Handler for `GET /health`
///
/// An unreachable cache store degrades the service but does not make it
/// unhealthy: chats still complete through the model.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_config = &state.config.cache;

    let (connected, store_error) = match state.pipeline.cache().ping().await {
        Ok(()) => (true, None),
        Err(e) => {
            error!("Cache store health check failed: {}", e);
            (false, Some(e.to_string()))
        }
    };

    let (host, port) = match cache_config.backend {
        CacheBackend::Redis => (cache_config.redis_host.clone(), cache_config.redis_port),
        CacheBackend::Memory => ("in-process".to_string(), 0),
    };

    Json(HealthResponse {
        status: if connected {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        service: state.config.service.name.clone(),
        version: state.config.service.version.clone(),
        env: state.config.service.env.clone(),
        cache_store: StoreHealth {
            backend: cache_config.backend,
            connected,
            host,
            port,
            error: store_error,
        },
        cache: state.pipeline.cache().stats(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handler for `GET /metrics` (Prometheus text format)
pub async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::gather_metrics(),
    )
}

/// Handler for `POST /generate-traffic?num_requests=&delay=`
pub async fn generate_traffic_handler(
    State(state): State<AppState>,
    params: std::result::Result<Query<TrafficParams>, QueryRejection>,
) -> Result<Json<TrafficStarted>, RelayError> {
    let Query(params) = params
        .map_err(|e| RelayError::InvalidRequest(format!("Invalid query string: {}", e.body_text())))?;
    params.validate()?;

    info!(
        "Scheduling {} generated requests ({}s apart)",
        params.num_requests, params.delay
    );
    traffic::spawn(state.pipeline.clone(), params);

    Ok(Json(TrafficStarted {
        status: "started".to_string(),
        message: format!("Generating {} requests in background", params.num_requests),
        num_requests: params.num_requests,
        delay_seconds: params.delay,
    }))
}
