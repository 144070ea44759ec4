//! Free-text proxy to the completion service, with per-user short-term
//! memory. A failed completion never pollutes the memory: only successful
//! exchanges are recorded.

mod client;
mod session;

pub use client::{CompletionOptions, CompletionService, HttpCompletionService, ServiceError};
pub use session::{ChatTurn, Role, SessionStore};

use std::sync::Arc;

use tracing::{debug, error};

use crate::bot::error::Error;
use crate::constants::defaults::{AI_SWEEP_INTERVAL_SECONDS, MAX_REPLY_CHARS};
use crate::platform::{Button, ChatId, ChatPlatform, UserId};
use crate::utils::formatting::truncate;

const SYSTEM_PROMPT: &str = "You are Meow, a friendly group-chat assistant. \
Keep answers short and upbeat. Politely decline anything inappropriate.";

const FALLBACK_REPLY: &str =
    "Sorry, I'm a little scrambled right now — please try again in a moment.";

/// Callback payload for the end-conversation button.
pub fn end_data(user: UserId) -> String {
    format!("end_{}", user.0)
}

/// Handle a free-text message: assemble system prompt + memory + the new
/// turn, call the completion service, and reply. Service failures produce an
/// apologetic fallback and leave the session untouched.
pub async fn handle_chat_message(
    platform: &dyn ChatPlatform,
    completion: &dyn CompletionService,
    sessions: &SessionStore,
    options: &CompletionOptions,
    chat: ChatId,
    user: UserId,
    text: &str,
) -> Result<(), Error> {
    let mut messages = vec![ChatTurn::system(SYSTEM_PROMPT)];
    messages.extend(sessions.history(user));
    messages.push(ChatTurn::user(text));

    match completion.complete(&messages, options).await {
        Ok(reply) => {
            // Memory keeps what the chat actually saw.
            let reply = truncate(&reply, MAX_REPLY_CHARS);
            sessions.record(user, text, &reply);
            platform
                .send_message(
                    chat,
                    &reply,
                    Some(vec![vec![Button::new("End conversation", end_data(user))]]),
                )
                .await?;
        }
        Err(err) => {
            error!(user = user.0, ?err, "completion failed");
            platform.send_message(chat, FALLBACK_REPLY, None).await?;
        }
    }
    Ok(())
}

/// End-conversation button: only the conversation's owner may clear it.
pub async fn handle_end(
    platform: &dyn ChatPlatform,
    sessions: &SessionStore,
    chat: ChatId,
    presser: UserId,
    owner: UserId,
) -> Result<(), Error> {
    if presser != owner {
        return Err(Error::precondition(
            "Only the conversation's owner can end it.",
        ));
    }
    sessions.end(owner);
    platform
        .send_message(chat, "Conversation ended, memory cleared.", None)
        .await?;
    Ok(())
}

/// Periodically drop idle sessions.
pub fn spawn_session_sweeper(sessions: Arc<SessionStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
            AI_SWEEP_INTERVAL_SECONDS,
        ));
        loop {
            ticker.tick().await;
            debug!("sweeping idle ai sessions");
            sessions.sweep();
        }
    });
}


#[cfg(test)]
mod tests {
    use super::testing::CannedCompletion;
    use super::*;
    use crate::platform::mock::MockPlatform;
    use std::time::Duration;

    const CHAT: ChatId = ChatId(1);
    const USER: UserId = UserId(2);

    fn store() -> SessionStore {
        SessionStore::new(10, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn successful_reply_is_remembered() {
        let platform = MockPlatform::new();
        let sessions = store();
        let completion = CannedCompletion::ok("hello there");

        handle_chat_message(
            &platform,
            &completion,
            &sessions,
            &CompletionOptions::default(),
            CHAT,
            USER,
            "hi",
        )
        .await
        .unwrap();

        assert_eq!(platform.sent_texts(), vec!["hello there".to_string()]);
        let history = sessions.history(USER);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1], ChatTurn::assistant("hello there"));
    }

    #[tokio::test]
    async fn oversized_replies_are_truncated_before_sending() {
        let platform = MockPlatform::new();
        let sessions = store();
        let completion = CannedCompletion::ok(&"x".repeat(MAX_REPLY_CHARS + 500));

        handle_chat_message(
            &platform,
            &completion,
            &sessions,
            &CompletionOptions::default(),
            CHAT,
            USER,
            "hi",
        )
        .await
        .unwrap();

        let sent = platform.sent_texts();
        assert_eq!(sent[0].chars().count(), MAX_REPLY_CHARS);
        assert!(sent[0].ends_with("..."));
        // memory holds the truncated reply, same as the chat saw
        assert_eq!(sessions.history(USER)[1].content, sent[0]);
    }

    #[tokio::test]
    async fn failure_sends_fallback_and_keeps_memory_clean() {
        let platform = MockPlatform::new();
        let sessions = store();
        let completion = CannedCompletion::failing();

        handle_chat_message(
            &platform,
            &completion,
            &sessions,
            &CompletionOptions::default(),
            CHAT,
            USER,
            "hi",
        )
        .await
        .unwrap();

        assert_eq!(platform.sent_texts(), vec![FALLBACK_REPLY.to_string()]);
        assert!(sessions.history(USER).is_empty());
    }

    #[tokio::test]
    async fn only_the_owner_ends_a_conversation() {
        let platform = MockPlatform::new();
        let sessions = store();
        sessions.record(USER, "q", "a");

        let err = handle_end(&platform, &sessions, CHAT, UserId(3), USER)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert!(!sessions.history(USER).is_empty());

        handle_end(&platform, &sessions, CHAT, USER, USER).await.unwrap();
        assert!(sessions.history(USER).is_empty());
    }
}
