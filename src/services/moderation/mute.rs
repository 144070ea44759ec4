use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::bot::error::Error;
use crate::platform::{ChatId, ChatPermissions, ChatPlatform, UserId};

/// Revoke send permissions for `duration`.
pub async fn mute_user(
    platform: &dyn ChatPlatform,
    chat: ChatId,
    user: UserId,
    duration: Duration,
) -> Result<(), Error> {
    let until = Utc::now()
        + chrono::Duration::from_std(duration)
            .map_err(|_| Error::precondition("Mute duration is too long."))?;
    platform
        .restrict_member(chat, user, ChatPermissions::muted(), Some(until))
        .await?;
    info!(chat = chat.0, user = user.0, secs = duration.as_secs(), "user muted");
    Ok(())
}

/// Restore full send permissions.
pub async fn unmute_user(
    platform: &dyn ChatPlatform,
    chat: ChatId,
    user: UserId,
) -> Result<(), Error> {
    platform
        .restrict_member(chat, user, ChatPermissions::unrestricted(), None)
        .await?;
    info!(chat = chat.0, user = user.0, "user unmuted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;

    const CHAT: ChatId = ChatId(3);
    const USER: UserId = UserId(8);

    #[tokio::test]
    async fn mute_restricts_with_deadline() {
        let platform = MockPlatform::new();
        mute_user(&platform, CHAT, USER, Duration::from_secs(600))
            .await
            .unwrap();
        let restriction = platform.last_restriction(USER).unwrap();
        assert_eq!(restriction.permissions, ChatPermissions::muted());
        assert!(restriction.until.is_some());
    }

    #[tokio::test]
    async fn unmute_restores_permissions() {
        let platform = MockPlatform::new();
        unmute_user(&platform, CHAT, USER).await.unwrap();
        let restriction = platform.last_restriction(USER).unwrap();
        assert_eq!(restriction.permissions, ChatPermissions::unrestricted());
        assert!(restriction.until.is_none());
    }
}
