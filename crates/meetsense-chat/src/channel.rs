//! Meeting channel naming and creation payloads.

use serde::Serialize;

/// Channel type used for every meeting channel.
pub const MESSAGING: &str = "messaging";

const MEETING_PREFIX: &str = "meet_";

/// Deterministic channel id for a meeting. The meeting id is not validated.
pub fn channel_id_for_meeting(meet_id: &str) -> String {
    format!("{MEETING_PREFIX}{meet_id}")
}

/// Custom data attached to a channel when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelData {
    pub name: String,
    pub members: Vec<String>,
    pub created_by: String,
}

impl ChannelData {
    /// Channel named after its id, with the creator as sole member.
    pub fn for_creator(channel_id: &str, user_id: &str) -> Self {
        Self {
            name: channel_id.to_string(),
            members: vec![user_id.to_string()],
            created_by: user_id.to_string(),
        }
    }
}

/// Wire form of [`ChannelData`] inside a channel query.
#[derive(Debug, Serialize)]
pub(crate) struct ChannelDataBody<'a> {
    pub name: &'a str,
    pub members: &'a [String],
    pub created_by: UserRef<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserRef<'a> {
    pub id: &'a str,
}

impl<'a> From<&'a ChannelData> for ChannelDataBody<'a> {
    fn from(data: &'a ChannelData) -> Self {
        Self {
            name: &data.name,
            members: &data.members,
            created_by: UserRef {
                id: &data.created_by,
            },
        }
    }
}
