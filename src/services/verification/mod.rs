use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::bot::error::Error;
use crate::config::Settings;
use crate::platform::{
    Button, ChatId, ChatPermissions, ChatPlatform, Event, MessageRef, UserId,
};
use crate::store::ExpiringStore;

/// State held while a new member is restricted. The entry and its timer are
/// one unit: both are created on join and both are removed on any exit path.
#[derive(Debug, Clone)]
pub struct PendingVerification {
    pub chat: ChatId,
    pub deadline: DateTime<Utc>,
    pub challenge: MessageRef,
}

/// Members awaiting the join challenge, keyed by user. Expiry is delivered
/// back into the dispatcher as [`Event::VerificationExpired`] rather than
/// handled on the timer task, so a tap and an expiry for the same user are
/// serialized by the event loop.
pub struct VerificationQueue {
    store: ExpiringStore<UserId, PendingVerification>,
}

impl VerificationQueue {
    pub fn new(scheduled: UnboundedSender<Event>) -> Self {
        let store = ExpiringStore::new(move |user, pending: PendingVerification| {
            if scheduled
                .send(Event::VerificationExpired {
                    chat: pending.chat,
                    user,
                    challenge: pending.challenge,
                })
                .is_err()
            {
                warn!(user = user.0, "verification expiry dropped: dispatcher gone");
            }
        });
        Self { store }
    }

    pub fn is_pending(&self, user: UserId) -> bool {
        self.store.contains(&user)
    }

    /// Remove and disarm in one step. `None` means the challenge already
    /// expired or was resolved.
    fn take(&self, user: UserId) -> Option<PendingVerification> {
        self.store.delete(&user)
    }
}

/// Callback payload for the challenge button.
pub fn challenge_data(user: UserId) -> String {
    format!("verify_{}", user.0)
}

/// New member joined: revoke send permissions, post the challenge, and start
/// the clock.
pub async fn begin(
    platform: &dyn ChatPlatform,
    queue: &VerificationQueue,
    settings: &Settings,
    chat: ChatId,
    user: UserId,
) -> Result<(), Error> {
    platform
        .restrict_member(chat, user, ChatPermissions::muted(), None)
        .await?;

    let timeout = settings.verification_timeout;
    let challenge = platform
        .send_message(
            chat,
            &format!(
                "Welcome! To keep bots out, tap the button below within {} seconds.",
                timeout.as_secs()
            ),
            Some(vec![vec![Button::new("I'm not a bot", challenge_data(user))]]),
        )
        .await?;

    queue.store.set(
        user,
        PendingVerification {
            chat,
            deadline: Utc::now() + chrono::Duration::seconds(timeout.as_secs() as i64),
            challenge,
        },
        Some(timeout),
    );
    info!(chat = chat.0, user = user.0, "verification challenge issued");
    Ok(())
}

/// Challenge button tapped. Only the challenged user may pass; anyone else
/// gets a non-mutating rejection. A tap that races with expiry or an admin
/// override finds no entry and is rejected the same way.
pub async fn tap(
    platform: &dyn ChatPlatform,
    queue: &VerificationQueue,
    presser: UserId,
    target: UserId,
) -> Result<(), Error> {
    if presser != target {
        return Err(Error::precondition("This verification button is not for you."));
    }

    let pending = queue
        .take(target)
        .ok_or_else(|| Error::precondition("This verification is expired or invalid."))?;

    finish(platform, pending, target).await
}

/// Admin override: verify without a tap. No pending entry is fine; the
/// permissions are restored either way.
pub async fn approve(
    platform: &dyn ChatPlatform,
    queue: &VerificationQueue,
    chat: ChatId,
    user: UserId,
) -> Result<(), Error> {
    match queue.take(user) {
        Some(pending) => finish(platform, pending, user).await,
        None => {
            platform
                .restrict_member(chat, user, ChatPermissions::unrestricted(), None)
                .await?;
            Ok(())
        }
    }
}

async fn finish(
    platform: &dyn ChatPlatform,
    pending: PendingVerification,
    user: UserId,
) -> Result<(), Error> {
    platform
        .restrict_member(pending.chat, user, ChatPermissions::unrestricted(), None)
        .await?;
    platform
        .edit_message(
            pending.challenge,
            "Verification passed — welcome aboard!",
            None,
        )
        .await?;
    info!(chat = pending.chat.0, user = user.0, "member verified");
    Ok(())
}

/// The deadline fired with the entry still present: remove the member from
/// the chat without leaving a ban record (ban then unban forces a re-invite),
/// and clean up the challenge prompt.
pub async fn expired(
    platform: &dyn ChatPlatform,
    chat: ChatId,
    user: UserId,
    challenge: MessageRef,
) -> Result<(), Error> {
    platform.ban_member(chat, user).await?;
    platform.unban_member(chat, user).await?;
    platform.delete_message(challenge).await?;
    platform
        .send_message(
            chat,
            "A new member failed to verify in time and was removed.",
            None,
        )
        .await?;
    info!(chat = chat.0, user = user.0, "verification expired, member removed");
    Ok(())
}
