//! HTTP handlers
//!
//! Chat endpoints forward to the configured [`ChatProvider`]; the emotion
//! endpoint runs the injected classifier.
//!
//! [`ChatProvider`]: meetsense_chat::ChatProvider

pub mod chat;
pub mod emotion;

// Re-export AppState from config
pub use crate::config::AppState;

pub use chat::{add_to_meeting_channel, create_channel, generate_chat_token, generate_token};
pub use emotion::predict_emotion;
