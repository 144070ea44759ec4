/// Warning escalation: warnings before a ban (can be overridden via env vars)
pub const DEFAULT_MAX_WARNINGS: u32 = 3;

/// Spam throttle: minimum gap between messages before the burst counter grows
pub const DEFAULT_SPAM_GAP_MS: u64 = 1000;
/// Spam throttle: consecutive sub-gap messages before the message is dropped
pub const DEFAULT_SPAM_BURST_LIMIT: u32 = 5;

/// Join verification: seconds a new member has to tap the challenge button
pub const DEFAULT_VERIFICATION_TIMEOUT_SECONDS: u64 = 300;

/// Plain /mute duration when no explicit duration is given
pub const DEFAULT_MUTE_SECONDS: u64 = 3600;

/// Daily check-in reward range (inclusive)
pub const DEFAULT_DAILY_MIN: i64 = 10;
pub const DEFAULT_DAILY_MAX: i64 = 50;
/// Flat bonus once a streak is running (streak > 1)
pub const DEFAULT_STREAK_BONUS: i64 = 20;
/// Streak counter cap
pub const DEFAULT_STREAK_MAX_DAYS: u32 = 7;

/// One-time point bonuses paid the day a streak first reaches the threshold
pub const STREAK_MILESTONES: &[(u32, i64)] = &[(3, 50), (7, 100), (14, 200), (30, 500)];

/// Gomoku stake bounds
pub const DEFAULT_MIN_BET: i64 = 1;
pub const DEFAULT_MAX_BET: i64 = 100;
/// Default stake when /gomoku is called without one
pub const DEFAULT_GOMOKU_STAKE: i64 = 10;
/// Board edge length
pub const DEFAULT_BOARD_SIZE: usize = 15;

/// Per-user game history kept in memory (newest first)
pub const GAME_HISTORY_LIMIT: usize = 50;

/// /clean defaults and ceiling
pub const DEFAULT_CLEAN_COUNT: u32 = 10;
pub const MAX_CLEAN_COUNT: u32 = 100;

/// AI conversation memory: turns kept per user, idle expiry, sweep cadence
pub const DEFAULT_AI_MAX_TURNS: usize = 10;
pub const DEFAULT_AI_IDLE_SECONDS: u64 = 30 * 60;
pub const AI_SWEEP_INTERVAL_SECONDS: u64 = 5 * 60;

/// Longest AI reply forwarded to the chat; anything past this is truncated
pub const MAX_REPLY_CHARS: usize = 4000;

/// Completion request knobs
pub const DEFAULT_COMPLETION_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_COMPLETION_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_COMPLETION_TEMPERATURE: f32 = 0.7;
