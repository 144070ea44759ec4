use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::ai::SessionStore;
use crate::config::Settings;
use crate::platform::Event;
use crate::services::economy::Ledger;
use crate::services::game::GameHub;
use crate::services::moderation::{Blocklist, SpamTracker};
use crate::services::verification::VerificationQueue;

/// Shared state available to every handler. Each field is its own keyed
/// store; cross-store operations are atomic per key only.
pub struct Data {
    pub settings: Settings,
    pub ledger: Ledger,
    pub spam: SpamTracker,
    pub blocklist: Blocklist,
    pub verification: VerificationQueue,
    pub games: GameHub,
    /// Shared with the background sweeper task.
    pub ai_sessions: Arc<SessionStore>,
}

impl Data {
    /// `scheduled` is the dispatcher's internal event channel; timers feed
    /// their expirations back through it.
    pub fn new(settings: Settings, scheduled: UnboundedSender<Event>) -> Self {
        Self {
            spam: SpamTracker::new(settings.spam_gap, settings.spam_burst_limit),
            blocklist: Blocklist::new(&settings.blocklist),
            verification: VerificationQueue::new(scheduled),
            ledger: Ledger::new(),
            games: GameHub::new(),
            ai_sessions: Arc::new(SessionStore::new(settings.ai_max_turns, settings.ai_idle)),
            settings,
        }
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
