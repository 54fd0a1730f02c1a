//! MeetSense Server Library
//!
//! One process, two independent flows: chat-provider passthroughs (tokens
//! and meeting channels) and facial emotion prediction.

pub mod config;
pub mod core;
pub mod handlers;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::{AppState, ServerConfig};
use meetsense_chat::StreamChatClient;
use meetsense_vision::{load_mini_xception, select_device};

pub use crate::core::router;

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "meetsense=debug,tower_http=debug,info".into());

    if tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_err()
    {
        // Already set, ignore
    }
}

pub async fn run() -> anyhow::Result<()> {
    info!("=== MeetSense Server ===");

    let config = ServerConfig::from_env().context("Invalid configuration")?;
    info!("Configuration: {:?}", config);

    // Initialize chat provider
    let chat = StreamChatClient::new(config.stream.clone())
        .context("Failed to initialize Stream Chat client")?;
    info!("Stream Chat client initialized ({})", config.stream.base_url);

    // Load the classifier once; the server never serves without it
    let device = select_device(&config.device)?;
    let classifier = load_mini_xception(&config.model_path, &device).map_err(|e| {
        error!("Failed to load emotion model: {}", e);
        e
    })?;
    info!("Emotion classifier ready on {:?}", device);

    let addr = config.bind_addr;
    let state = AppState::new(config, Arc::new(chat), Arc::new(classifier));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("MeetSense server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
