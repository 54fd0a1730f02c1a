use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use meetsense_chat::ChatError;
use meetsense_vision::VisionError;
use serde_json::json;
use thiserror::Error;

/// Handler errors. Client input problems are 400s; everything else is a 500
/// carrying the underlying message.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    /// Malformed or oversized multipart upload.
    #[error("{}", .0.body_text())]
    Upload(#[from] MultipartError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Upload(err) => err.status(),
            Error::Chat(_) | Error::Vision(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "detail": self.to_string()
        }));

        (self.status(), body).into_response()
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(err.to_string())
    }
}
