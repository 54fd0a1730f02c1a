//! Error types for chat provider operations.

use thiserror::Error;

/// Result type for chat provider operations.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur while talking to the chat provider.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChatError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("Token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid provider URL: {0}")]
    Url(String),

    /// Non-2xx answer from the provider, with its own error code when it sent one.
    #[error("StreamChat error code {code}: {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },
}
