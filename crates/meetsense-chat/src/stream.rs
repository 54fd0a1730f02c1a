//! Stream Chat REST client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::channel::{ChannelData, ChannelDataBody};
use crate::error::{ChatError, Result};
use crate::token::{server_token, user_token};
use crate::ChatProvider;

pub const DEFAULT_BASE_URL: &str = "https://chat.stream-io-api.com";

/// Credentials and endpoint for a Stream Chat application.
#[derive(Clone)]
pub struct StreamConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl StreamConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Server-side Stream Chat client.
pub struct StreamChatClient {
    config: StreamConfig,
    base_url: Url,
    http: reqwest::Client,
    /// Server tokens carry no expiry, so one is signed up front and reused.
    server_token: String,
}

#[derive(Serialize)]
struct QueryChannelRequest<'a> {
    data: ChannelDataBody<'a>,
    state: bool,
    watch: bool,
    presence: bool,
}

#[derive(Serialize)]
struct AddMembersRequest<'a> {
    add_members: &'a [String],
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

impl StreamChatClient {
    pub fn new(config: StreamConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ChatError::Url(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ChatError::Url(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("meetsense-chat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let server_token = server_token(&config.api_secret)?;

        Ok(Self {
            config,
            base_url,
            http,
            server_token,
        })
    }

    /// Builds `{base}/<segments...>?api_key=<key>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ChatError::Url(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("api_key", &self.config.api_key);
        Ok(url)
    }

    async fn post<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<()> {
        debug!("POST {}", url.path());

        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, &self.server_token)
            .header("stream-auth-type", "jwt")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let error = api_error(status.as_u16(), &text);
        warn!("Stream Chat rejected request: {}", error);
        Err(error)
    }
}

fn api_error(status: u16, body: &str) -> ChatError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => ChatError::Api {
            status,
            code: parsed.code.unwrap_or(-1),
            message: parsed.message.unwrap_or_else(|| body.to_string()),
        },
        Err(_) => ChatError::Api {
            status,
            code: -1,
            message: if body.is_empty() {
                format!("HTTP status {}", status)
            } else {
                body.to_string()
            },
        },
    }
}

#[async_trait]
impl ChatProvider for StreamChatClient {
    async fn create_token(&self, user_id: &str) -> Result<String> {
        user_token(&self.config.api_secret, user_id)
    }

    async fn create_channel(
        &self,
        channel_type: &str,
        channel_id: &str,
        data: &ChannelData,
    ) -> Result<()> {
        let url = self.endpoint(&["channels", channel_type, channel_id, "query"])?;
        let body = QueryChannelRequest {
            data: ChannelDataBody::from(data),
            state: false,
            watch: false,
            presence: false,
        };
        self.post(url, &body).await
    }

    async fn add_members(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<()> {
        let url = self.endpoint(&["channels", channel_type, channel_id])?;
        self.post(url, &AddMembersRequest {
            add_members: user_ids,
        })
        .await
    }
}
