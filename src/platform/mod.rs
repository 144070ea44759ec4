mod types;

#[cfg(test)]
pub mod mock;

pub use types::{
    Button, ChatId, ChatPermissions, Event, Keyboard, MemberRole, MessageRef, UserId,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by the chat platform. `NotPermitted` is the common case:
/// the bot lacks the privilege for a moderation call.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("bot lacks the required permission")]
    NotPermitted,

    #[error("message or member not found")]
    NotFound,

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// The outbound half of the chat platform. The core never talks to a
/// concrete transport; embedders implement this and feed inbound updates to
/// the dispatcher as [`Event`]s.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        controls: Option<Keyboard>,
    ) -> Result<MessageRef, PlatformError>;

    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        controls: Option<Keyboard>,
    ) -> Result<(), PlatformError>;

    async fn delete_message(&self, message: MessageRef) -> Result<(), PlatformError>;

    async fn restrict_member(
        &self,
        chat: ChatId,
        user: UserId,
        permissions: ChatPermissions,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError>;

    async fn ban_member(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError>;

    async fn unban_member(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError>;

    async fn member_role(&self, chat: ChatId, user: UserId) -> Result<MemberRole, PlatformError>;
}
