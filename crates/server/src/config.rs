//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use meetsense_chat::{ChatProvider, StreamConfig};
use meetsense_vision::Classifier;

/// Configuration for the MeetSense server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: SocketAddr,
    /// Chat provider credentials and endpoint
    pub stream: StreamConfig,
    /// Emotion classifier weights (safetensors)
    pub model_path: PathBuf,
    /// Inference device spec (`cpu`, `cuda:<n>`)
    pub device: String,
    /// Max request body size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            stream: StreamConfig::new("", ""),
            model_path: PathBuf::from("mini_xception_final_model.safetensors"),
            device: "cpu".to_string(),
            max_upload_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup. Unset keys fall
    /// back to defaults, except the provider credentials.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("invalid BIND_ADDR: {}", addr))?;
        }

        config.stream.api_key = required(&lookup, "STREAM_API_KEY")?;
        config.stream.api_secret = required(&lookup, "STREAM_API_SECRET")?;
        if let Some(url) = lookup("STREAM_BASE_URL") {
            config.stream.base_url = url;
        }
        if let Some(secs) = lookup("STREAM_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("invalid STREAM_TIMEOUT_SECS: {}", secs))?;
            config.stream.timeout = Duration::from_secs(secs);
        }

        if let Some(path) = lookup("EMOTION_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(device) = lookup("INFERENCE_DEVICE") {
            config.device = device;
        }
        if let Some(limit) = lookup("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit
                .parse()
                .with_context(|| format!("invalid MAX_UPLOAD_BYTES: {}", limit))?;
        }

        Ok(config)
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{} must be set", key),
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub chat: Arc<dyn ChatProvider>,
    pub classifier: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        chat: Arc<dyn ChatProvider>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            chat,
            classifier,
        }
    }
}
