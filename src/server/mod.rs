//! Axum-based HTTP server for the chat relay.
//!
//! This module exposes the chat pipeline over HTTP and adds the read-only
//! collaborators around it: history, health and Prometheus metrics.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual endpoints (chat, history, health, metrics, traffic).
//! - `middleware`: Request ID tracking and CORS.
//! - `routes`: The main router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::{HealthResponse, HealthStatus, HistoryResponse, StoreHealth, TrafficStarted};
pub use routes::{create_router, AppState};
