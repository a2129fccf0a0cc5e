// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    chat_handler, generate_traffic_handler, health_handler, history_handler, metrics_handler,
};
use super::middleware::{cors_layer, request_id_layers};
use crate::config::AppConfig;
use crate::pipeline::ChatPipeline;
use axum::{routing::{get, post}, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Request bodies above this size are rejected before deserialization.
const MAX_BODY_BYTES: usize = 256 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<ChatPipeline>,
}

pub fn create_router(config: AppConfig, pipeline: Arc<ChatPipeline>) -> Router {
    let enable_cors = config.server.enable_cors;
    let state = AppState {
        config: Arc::new(config),
        pipeline,
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/chat", post(chat_handler))
        .route("/history", get(history_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/generate-traffic", post(generate_traffic_handler))
        .layer(tower_http::limit::RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    if enable_cors {
        app.layer(cors_layer())
    } else {
        app
    }
}
