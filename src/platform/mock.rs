//! Recording platform used by unit tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{
    ChatId, ChatPermissions, ChatPlatform, Keyboard, MemberRole, MessageRef, PlatformError, UserId,
};

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat: ChatId,
    pub text: String,
    pub controls: Option<Keyboard>,
    pub message: MessageRef,
}

#[derive(Debug, Clone)]
pub struct Restriction {
    pub chat: ChatId,
    pub user: UserId,
    pub permissions: ChatPermissions,
    pub until: Option<DateTime<Utc>>,
}

/// Records every outbound call for assertion. Roles default to `Member`
/// unless set with [`MockPlatform::set_role`].
#[derive(Default)]
pub struct MockPlatform {
    next_message_id: AtomicU64,
    pub sent: Mutex<Vec<SentMessage>>,
    pub edited: Mutex<Vec<(MessageRef, String)>>,
    pub deleted: Mutex<Vec<MessageRef>>,
    pub restricted: Mutex<Vec<Restriction>>,
    pub banned: Mutex<Vec<(ChatId, UserId)>>,
    pub unbanned: Mutex<Vec<(ChatId, UserId)>>,
    roles: DashMap<(ChatId, UserId), MemberRole>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role(&self, chat: ChatId, user: UserId, role: MemberRole) {
        self.roles.insert((chat, user), role);
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn ban_count(&self, chat: ChatId, user: UserId) -> usize {
        self.banned
            .lock()
            .unwrap()
            .iter()
            .filter(|&&entry| entry == (chat, user))
            .count()
    }

    pub fn last_restriction(&self, user: UserId) -> Option<Restriction> {
        self.restricted
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.user == user)
            .cloned()
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        controls: Option<Keyboard>,
    ) -> Result<MessageRef, PlatformError> {
        let message = MessageRef {
            chat,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.sent.lock().unwrap().push(SentMessage {
            chat,
            text: text.to_string(),
            controls,
            message,
        });
        Ok(message)
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        _controls: Option<Keyboard>,
    ) -> Result<(), PlatformError> {
        self.edited
            .lock()
            .unwrap()
            .push((message, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), PlatformError> {
        self.deleted.lock().unwrap().push(message);
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat: ChatId,
        user: UserId,
        permissions: ChatPermissions,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError> {
        self.restricted.lock().unwrap().push(Restriction {
            chat,
            user,
            permissions,
            until,
        });
        Ok(())
    }

    async fn ban_member(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError> {
        self.banned.lock().unwrap().push((chat, user));
        Ok(())
    }

    async fn unban_member(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError> {
        self.unbanned.lock().unwrap().push((chat, user));
        Ok(())
    }

    async fn member_role(&self, chat: ChatId, user: UserId) -> Result<MemberRole, PlatformError> {
        Ok(self
            .roles
            .get(&(chat, user))
            .map(|r| *r)
            .unwrap_or(MemberRole::Member))
    }
}
