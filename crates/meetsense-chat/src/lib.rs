//! Chat provider integration for MeetSense.
//!
//! Meeting rooms get a companion chat channel hosted by an external
//! messaging provider. This crate hides that provider behind the
//! [`ChatProvider`] trait and ships a Stream Chat implementation
//! ([`StreamChatClient`]).

pub mod channel;
pub mod error;
pub mod stream;
pub mod token;

pub use channel::{channel_id_for_meeting, ChannelData, MESSAGING};
pub use error::{ChatError, Result};
pub use stream::{StreamChatClient, StreamConfig};

use async_trait::async_trait;

/// Operations the server needs from a chat backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Issues a signed token the given user can present to the provider.
    async fn create_token(&self, user_id: &str) -> Result<String>;

    /// Creates (or lets the provider resolve an existing) channel.
    async fn create_channel(
        &self,
        channel_type: &str,
        channel_id: &str,
        data: &ChannelData,
    ) -> Result<()>;

    /// Adds users to an existing channel.
    async fn add_members(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<()>;
}
