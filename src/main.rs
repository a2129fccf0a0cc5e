// gemini-chat-relay - Gemini chat relay with response caching and jailbreak screening
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use gemini_chat_relay::cli::Args;
use gemini_chat_relay::config::AppConfig;
use gemini_chat_relay::gemini::GeminiClient;
use gemini_chat_relay::pipeline::ChatPipeline;
use gemini_chat_relay::server::create_router;
use gemini_chat_relay::utils::logging;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!(
        "Starting {} v{} (env: {})",
        config.service.name, config.service.version, config.service.env
    );

    // Phase 3: Build the completion client and the pipeline around it
    let gemini_client = GeminiClient::new(&config.gemini)?;
    info!("Using Gemini model {}", config.gemini.model);
    let pipeline = Arc::new(ChatPipeline::from_config(&config, Arc::new(gemini_client))?);

    // Phase 4: Warm the cache store connection; failures are not fatal
    if let Err(e) = pipeline.cache().ping().await {
        warn!("Cache store unavailable at startup, continuing without it: {}", e);
    }

    // Phase 5: Build and start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(config, pipeline);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
