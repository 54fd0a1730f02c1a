//! Emotion prediction handler

use crate::config::AppState;
use crate::core::{Error, Result};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use meetsense_vision::Prediction;
use tracing::{error, info, warn};

fn is_image(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("image/"))
}

/// POST /predict-emotion
///
/// Expects a multipart `file` part with an `image/*` content type.
pub async fn predict_emotion(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>> {
    info!("POST /predict-emotion");

    let mut multipart = multipart.map_err(|e| Error::BadRequest(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        if !is_image(content_type.as_deref()) {
            warn!("Rejected upload with content type {:?}", content_type);
            return Err(Error::BadRequest("File must be an image".to_string()));
        }

        upload = Some(field.bytes().await?);
        break;
    }

    let bytes = upload.ok_or_else(|| Error::BadRequest("File is required".to_string()))?;
    let size = bytes.len();

    let classifier = state.classifier.clone();
    let prediction = tokio::task::spawn_blocking(move || {
        meetsense_vision::predict_emotion(classifier.as_ref(), &bytes)
    })
    .await?
    .map_err(|e| {
        error!("Emotion prediction failed ({} bytes): {}", size, e);
        Error::from(e)
    })?;

    info!(
        emotion = %prediction.emotion,
        confidence = prediction.confidence,
        "Predicted emotion"
    );
    Ok(Json(prediction))
}
