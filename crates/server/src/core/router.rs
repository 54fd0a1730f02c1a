//! Core Router
//!
//! Wires every endpoint to its handler and applies the shared layers.

use crate::config::AppState;
use crate::handlers::{chat, emotion};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Chat provider passthroughs
        .route("/generate-token", post(chat::generate_token))
        .route("/generate-chat-token", post(chat::generate_chat_token))
        .route("/create-channel", post(chat::create_channel))
        .route("/add-to-meeting-channel", post(chat::add_to_meeting_channel))
        // Emotion inference
        .route("/predict-emotion", post(emotion::predict_emotion))
        // Health check
        .route("/health", get(health_check))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}
