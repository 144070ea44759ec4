use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::platform::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a conversation, in the completion service's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

struct AiSession {
    history: Vec<ChatTurn>,
    last_interaction: Instant,
}

/// Short-term conversation memory, one session per user. Sessions idle past
/// the expiry are dropped, either lazily on access or by the periodic sweep.
pub struct SessionStore {
    sessions: DashMap<UserId, AiSession>,
    /// Kept turns = this many user/assistant pairs.
    max_turns: usize,
    idle: Duration,
}

impl SessionStore {
    pub fn new(max_turns: usize, idle: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns,
            idle,
        }
    }

    /// Current history for the user, oldest first. An expired session is
    /// discarded and treated as absent.
    pub fn history(&self, user: UserId) -> Vec<ChatTurn> {
        if let Some(session) = self.sessions.get(&user) {
            if session.last_interaction.elapsed() < self.idle {
                return session.history.clone();
            }
        }
        self.sessions.remove(&user);
        Vec::new()
    }

    /// Record a completed exchange, trimming to the configured window.
    pub fn record(&self, user: UserId, question: &str, answer: &str) {
        let mut entry = self.sessions.entry(user).or_insert_with(|| AiSession {
            history: Vec::new(),
            last_interaction: Instant::now(),
        });
        let session = entry.value_mut();
        session.history.push(ChatTurn::user(question));
        session.history.push(ChatTurn::assistant(answer));

        let limit = self.max_turns * 2;
        if session.history.len() > limit {
            let excess = session.history.len() - limit;
            session.history.drain(..excess);
        }
        session.last_interaction = Instant::now();
    }

    /// Forget a user's conversation. Returns whether one existed.
    pub fn end(&self, user: UserId) -> bool {
        self.sessions.remove(&user).is_some()
    }

    /// Drop all idle sessions. Called from the background sweeper.
    pub fn sweep(&self) {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_interaction.elapsed() < self.idle);
        let dropped = before - self.sessions.len();
        if dropped > 0 {
            debug!(dropped, "idle ai sessions swept");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId(21);

    #[test]
    fn record_and_replay_history() {
        let store = SessionStore::new(10, Duration::from_secs(60));
        store.record(USER, "hi", "hello!");
        let history = store.history(USER);
        assert_eq!(
            history,
            vec![ChatTurn::user("hi"), ChatTurn::assistant("hello!")]
        );
    }

    #[test]
    fn history_is_trimmed_to_the_window() {
        let store = SessionStore::new(3, Duration::from_secs(60));
        for i in 0..10 {
            store.record(USER, &format!("q{i}"), &format!("a{i}"));
        }
        let history = store.history(USER);
        assert_eq!(history.len(), 6);
        assert_eq!(history[0], ChatTurn::user("q7"));
        assert_eq!(history[5], ChatTurn::assistant("a9"));
    }

    #[test]
    fn end_clears_the_session() {
        let store = SessionStore::new(10, Duration::from_secs(60));
        store.record(USER, "hi", "hello!");
        assert!(store.end(USER));
        assert!(!store.end(USER));
        assert!(store.history(USER).is_empty());
    }

    #[test]
    fn idle_sessions_expire() {
        let store = SessionStore::new(10, Duration::from_millis(0));
        store.record(USER, "hi", "hello!");
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.history(USER).is_empty());

        store.record(USER, "hi", "hello!");
        std::thread::sleep(Duration::from_millis(5));
        store.sweep();
        assert!(!store.end(USER));
    }

    #[test]
    fn turns_serialize_in_wire_shape() {
        let turn = ChatTurn::assistant("ok");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }
}
