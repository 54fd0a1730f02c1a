//! Chat token and meeting channel handlers
//!
//! Thin passthroughs to the chat provider. Input validation happens here so
//! a bad request never reaches the provider.

use crate::config::AppState;
use crate::core::{Error, FormFields, Result};
use axum::{extract::State, Json};
use meetsense_chat::{channel_id_for_meeting, ChannelData, MESSAGING};
use serde::Serialize;
use tracing::{info, warn};

const USER_ID_REQUIRED: &str = "User ID is required";
const MEETING_FIELDS_REQUIRED: &str = "Missing meet_id or user_id";

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ChatTokenResponse {
    pub chat_token: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub channel_id: String,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub status: &'static str,
    pub channel_id: String,
}

async fn issue_token(state: &AppState, fields: &FormFields) -> Result<String> {
    let user_id = fields
        .required("user_id")
        .ok_or_else(|| Error::BadRequest(USER_ID_REQUIRED.to_string()))?;

    state.chat.create_token(user_id).await.map_err(|e| {
        warn!("Token issuance failed for {}: {}", user_id, e);
        Error::from(e)
    })
}

fn meeting_fields(fields: &FormFields) -> Result<(&str, &str)> {
    match (fields.required("meet_id"), fields.required("user_id")) {
        (Some(meet_id), Some(user_id)) => Ok((meet_id, user_id)),
        _ => Err(Error::BadRequest(MEETING_FIELDS_REQUIRED.to_string())),
    }
}

/// POST /generate-token
pub async fn generate_token(
    State(state): State<AppState>,
    fields: FormFields,
) -> Result<Json<TokenResponse>> {
    info!("POST /generate-token");
    let token = issue_token(&state, &fields).await?;
    Ok(Json(TokenResponse { token }))
}

/// POST /generate-chat-token
pub async fn generate_chat_token(
    State(state): State<AppState>,
    fields: FormFields,
) -> Result<Json<ChatTokenResponse>> {
    info!("POST /generate-chat-token");
    let chat_token = issue_token(&state, &fields).await?;
    Ok(Json(ChatTokenResponse { chat_token }))
}

/// POST /create-channel
pub async fn create_channel(
    State(state): State<AppState>,
    fields: FormFields,
) -> Result<Json<ChannelResponse>> {
    let (meet_id, user_id) = meeting_fields(&fields)?;
    let channel_id = channel_id_for_meeting(meet_id);
    info!("POST /create-channel - {} by {}", channel_id, user_id);

    let data = ChannelData::for_creator(&channel_id, user_id);
    state
        .chat
        .create_channel(MESSAGING, &channel_id, &data)
        .await
        .map_err(|e| {
            warn!("Creating {} failed: {}", channel_id, e);
            Error::Internal(format!("Error creating channel: {}", e))
        })?;

    Ok(Json(ChannelResponse { channel_id }))
}

/// POST /add-to-meeting-channel
pub async fn add_to_meeting_channel(
    State(state): State<AppState>,
    fields: FormFields,
) -> Result<Json<MembershipResponse>> {
    let (meet_id, user_id) = meeting_fields(&fields)?;
    let channel_id = channel_id_for_meeting(meet_id);
    info!("POST /add-to-meeting-channel - {} joins {}", user_id, channel_id);

    state
        .chat
        .add_members(MESSAGING, &channel_id, &[user_id.to_string()])
        .await
        .map_err(|e| {
            warn!("Adding {} to {} failed: {}", user_id, channel_id, e);
            Error::Internal(format!("Error adding to channel: {}", e))
        })?;

    Ok(Json(MembershipResponse {
        status: "success",
        channel_id,
    }))
}
