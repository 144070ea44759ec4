use std::fmt;

/// A chat member. Distinct from [`ChatId`] so the two kinds of key can never
/// be swapped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// A group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a message the bot can later edit or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: u64,
}

/// Member role as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    /// Owners and admins may run gated commands.
    pub fn is_admin(self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }
}

/// Send permissions applied via `restrict_member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatPermissions {
    pub can_send_messages: bool,
    pub can_send_media: bool,
    pub can_send_other: bool,
}

impl ChatPermissions {
    /// Everything off: the state of a muted or unverified member.
    pub fn muted() -> Self {
        Self {
            can_send_messages: false,
            can_send_media: false,
            can_send_other: false,
        }
    }

    /// Everything on: the state of a regular member.
    pub fn unrestricted() -> Self {
        Self {
            can_send_messages: true,
            can_send_media: true,
            can_send_other: true,
        }
    }
}

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Button rows attached to a message.
pub type Keyboard = Vec<Vec<Button>>;

/// Everything the dispatcher consumes. The first three arrive from the
/// platform; `VerificationExpired` is scheduled internally by the expiring
/// store and travels the same path so timer handling cannot race command
/// handling for the same user.
#[derive(Debug, Clone)]
pub enum Event {
    Message {
        chat: ChatId,
        user: UserId,
        text: String,
        message: MessageRef,
    },
    NewMember {
        chat: ChatId,
        user: UserId,
    },
    ButtonPress {
        user: UserId,
        data: String,
        message: MessageRef,
    },
    VerificationExpired {
        chat: ChatId,
        user: UserId,
        challenge: MessageRef,
    },
}
