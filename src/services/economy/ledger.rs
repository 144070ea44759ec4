use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::constants::defaults::GAME_HISTORY_LIMIT;
use crate::platform::UserId;

/// One-time achievements. Granting is idempotent; a grant that is already
/// present is silently a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Achievement {
    /// Cumulative check-in milestones
    CheckIns7,
    CheckIns30,
    CheckIns100,
    CheckIns365,
    /// First gomoku victory
    FirstWin,
}

impl Achievement {
    pub fn title(self) -> &'static str {
        match self {
            Achievement::CheckIns7 => "7 total check-ins",
            Achievement::CheckIns30 => "30 total check-ins",
            Achievement::CheckIns100 => "100 total check-ins",
            Achievement::CheckIns365 => "365 total check-ins",
            Achievement::FirstWin => "first gomoku win",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

#[derive(Debug, Clone)]
pub struct GameRecord {
    pub opponent: UserId,
    pub stake: i64,
    pub outcome: GameOutcome,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct GameStats {
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Newest first, bounded at [`GAME_HISTORY_LIMIT`].
    pub history: VecDeque<GameRecord>,
}

/// Per-user state. Created lazily on first interaction and kept for the
/// lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    pub points: i64,
    pub warning_count: u32,
    pub last_check_in: Option<NaiveDate>,
    pub check_in_streak: u32,
    pub total_check_ins: u32,
    pub achievements: HashSet<Achievement>,
    pub inventory: HashMap<String, u32>,
    pub game_stats: GameStats,
}

/// The shared points/warnings ledger. Every mutation goes through [`with`],
/// which holds the per-key entry lock for the whole read-modify-write, so a
/// check-then-act sequence (balance check + debit, warn + threshold test)
/// can never interleave with another event for the same user.
#[derive(Default)]
pub struct Ledger {
    records: DashMap<UserId, UserRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic read-modify-write on a user's record, creating it on first use.
    /// The closure must not block or await.
    pub fn with<R>(&self, user: UserId, f: impl FnOnce(&mut UserRecord) -> R) -> R {
        let mut entry = self.records.entry(user).or_default();
        f(entry.value_mut())
    }

    pub fn points(&self, user: UserId) -> i64 {
        self.records.get(&user).map(|r| r.points).unwrap_or(0)
    }

    pub fn credit(&self, user: UserId, amount: i64) -> i64 {
        self.with(user, |rec| {
            rec.points += amount;
            rec.points
        })
    }

    /// Debit preconditioned on a sufficient balance; the balance can never
    /// go negative. Returns the new balance, or `None` without mutating.
    pub fn try_debit(&self, user: UserId, amount: i64) -> Option<i64> {
        self.with(user, |rec| {
            if rec.points < amount {
                return None;
            }
            rec.points -= amount;
            Some(rec.points)
        })
    }

    pub fn add_warning(&self, user: UserId) -> u32 {
        self.with(user, |rec| {
            rec.warning_count += 1;
            rec.warning_count
        })
    }

    pub fn remove_warning(&self, user: UserId) -> u32 {
        self.with(user, |rec| {
            rec.warning_count = rec.warning_count.saturating_sub(1);
            rec.warning_count
        })
    }

    /// Reset after a ban; a rejoining user starts from a clean count.
    pub fn clear_warnings(&self, user: UserId) {
        self.with(user, |rec| rec.warning_count = 0);
    }

    pub fn warnings(&self, user: UserId) -> u32 {
        self.records
            .get(&user)
            .map(|r| r.warning_count)
            .unwrap_or(0)
    }

    /// Returns true when the achievement was newly granted.
    pub fn grant_achievement(&self, user: UserId, achievement: Achievement) -> bool {
        let granted = self.with(user, |rec| rec.achievements.insert(achievement));
        if granted {
            debug!(user = user.0, title = achievement.title(), "achievement granted");
        }
        granted
    }

    /// Append to the bounded game history (newest first) and bump the
    /// aggregate counters.
    pub fn record_game(&self, user: UserId, record: GameRecord) {
        self.with(user, |rec| {
            let stats = &mut rec.game_stats;
            stats.played += 1;
            match record.outcome {
                GameOutcome::Win => stats.wins += 1,
                GameOutcome::Loss => stats.losses += 1,
                GameOutcome::Draw => stats.draws += 1,
            }
            stats.history.push_front(record);
            stats.history.truncate(GAME_HISTORY_LIMIT);
        });
    }

    pub fn snapshot(&self, user: UserId) -> UserRecord {
        self.records
            .get(&user)
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId(1);

    #[test]
    fn debit_never_goes_negative() {
        let ledger = Ledger::new();
        ledger.credit(USER, 30);
        assert_eq!(ledger.try_debit(USER, 40), None);
        assert_eq!(ledger.points(USER), 30);
        assert_eq!(ledger.try_debit(USER, 30), Some(0));
        assert_eq!(ledger.try_debit(USER, 1), None);
    }

    #[test]
    fn warnings_floor_at_zero_and_reset() {
        let ledger = Ledger::new();
        assert_eq!(ledger.remove_warning(USER), 0);
        assert_eq!(ledger.add_warning(USER), 1);
        assert_eq!(ledger.add_warning(USER), 2);
        ledger.clear_warnings(USER);
        assert_eq!(ledger.warnings(USER), 0);
    }

    #[test]
    fn achievements_grant_once() {
        let ledger = Ledger::new();
        assert!(ledger.grant_achievement(USER, Achievement::FirstWin));
        assert!(!ledger.grant_achievement(USER, Achievement::FirstWin));
    }

    #[test]
    fn game_history_is_bounded_newest_first() {
        let ledger = Ledger::new();
        for i in 0..60 {
            ledger.record_game(
                USER,
                GameRecord {
                    opponent: UserId(100 + i),
                    stake: i as i64,
                    outcome: GameOutcome::Win,
                    finished_at: Utc::now(),
                },
            );
        }
        let rec = ledger.snapshot(USER);
        assert_eq!(rec.game_stats.played, 60);
        assert_eq!(rec.game_stats.wins, 60);
        assert_eq!(rec.game_stats.history.len(), GAME_HISTORY_LIMIT);
        // newest first: the last recorded opponent is at the front
        assert_eq!(rec.game_stats.history[0].opponent, UserId(159));
    }
}
