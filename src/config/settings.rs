use std::env;
use std::time::Duration;

use crate::constants::defaults::{
    DEFAULT_AI_IDLE_SECONDS, DEFAULT_AI_MAX_TURNS, DEFAULT_BOARD_SIZE, DEFAULT_COMPLETION_MODEL,
    DEFAULT_DAILY_MAX, DEFAULT_DAILY_MIN, DEFAULT_MAX_BET, DEFAULT_MAX_WARNINGS, DEFAULT_MIN_BET,
    DEFAULT_MUTE_SECONDS, DEFAULT_SPAM_BURST_LIMIT, DEFAULT_SPAM_GAP_MS, DEFAULT_STREAK_BONUS,
    DEFAULT_STREAK_MAX_DAYS, DEFAULT_VERIFICATION_TIMEOUT_SECONDS,
};

#[derive(Debug, Clone)]
pub struct Settings {
    /// Warnings before an automatic ban
    pub max_warnings: u32,
    /// Spam throttle: gap below which the burst counter grows
    pub spam_gap: Duration,
    /// Spam throttle: burst size that triggers deletion
    pub spam_burst_limit: u32,
    /// How long a new member has to complete the join challenge
    pub verification_timeout: Duration,
    /// Duration applied by plain /mute
    pub default_mute: Duration,
    /// Daily check-in reward range (inclusive)
    pub daily_min: i64,
    pub daily_max: i64,
    /// Bonus paid on top of the roll while a streak is running
    pub streak_bonus: i64,
    /// Streak counter cap
    pub streak_max_days: u32,
    /// Gomoku stake bounds
    pub min_bet: i64,
    pub max_bet: i64,
    /// Gomoku board edge length
    pub board_size: usize,
    /// Extra case-sensitive content-policy words on top of the built-in list
    pub blocklist: Vec<String>,
    /// AI proxy: turns of memory kept per user and idle expiry
    pub ai_max_turns: usize,
    pub ai_idle: Duration,
    /// Completion service endpoint (None leaves the AI proxy unconfigured)
    pub completion_api_url: Option<String>,
    pub completion_api_key: Option<String>,
    pub completion_model: String,
}

impl Settings {
    /// Build settings from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            max_warnings: env_parse("MAX_WARNINGS", DEFAULT_MAX_WARNINGS),
            spam_gap: Duration::from_millis(env_parse("SPAM_GAP_MS", DEFAULT_SPAM_GAP_MS)),
            spam_burst_limit: env_parse("SPAM_BURST_LIMIT", DEFAULT_SPAM_BURST_LIMIT),
            verification_timeout: Duration::from_secs(env_parse(
                "VERIFICATION_TIMEOUT_SECONDS",
                DEFAULT_VERIFICATION_TIMEOUT_SECONDS,
            )),
            default_mute: Duration::from_secs(env_parse(
                "DEFAULT_MUTE_SECONDS",
                DEFAULT_MUTE_SECONDS,
            )),
            daily_min: env_parse("DAILY_POINTS_MIN", DEFAULT_DAILY_MIN),
            daily_max: env_parse("DAILY_POINTS_MAX", DEFAULT_DAILY_MAX),
            streak_bonus: env_parse("STREAK_BONUS", DEFAULT_STREAK_BONUS),
            streak_max_days: env_parse("STREAK_MAX_DAYS", DEFAULT_STREAK_MAX_DAYS),
            min_bet: env_parse("GOMOKU_MIN_BET", DEFAULT_MIN_BET),
            max_bet: env_parse("GOMOKU_MAX_BET", DEFAULT_MAX_BET),
            board_size: env_parse("GOMOKU_BOARD_SIZE", DEFAULT_BOARD_SIZE),
            blocklist: env::var("BLOCKLIST_WORDS")
                .map(|raw| {
                    raw.split(',')
                        .map(|w| w.trim().to_string())
                        .filter(|w| !w.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            ai_max_turns: env_parse("AI_MAX_TURNS", DEFAULT_AI_MAX_TURNS),
            ai_idle: Duration::from_secs(env_parse("AI_IDLE_SECONDS", DEFAULT_AI_IDLE_SECONDS)),
            completion_api_url: env::var("COMPLETION_API_URL").ok().filter(|s| !s.is_empty()),
            completion_api_key: env::var("COMPLETION_API_KEY").ok().filter(|s| !s.is_empty()),
            completion_model: env::var("COMPLETION_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_warnings: DEFAULT_MAX_WARNINGS,
            spam_gap: Duration::from_millis(DEFAULT_SPAM_GAP_MS),
            spam_burst_limit: DEFAULT_SPAM_BURST_LIMIT,
            verification_timeout: Duration::from_secs(DEFAULT_VERIFICATION_TIMEOUT_SECONDS),
            default_mute: Duration::from_secs(DEFAULT_MUTE_SECONDS),
            daily_min: DEFAULT_DAILY_MIN,
            daily_max: DEFAULT_DAILY_MAX,
            streak_bonus: DEFAULT_STREAK_BONUS,
            streak_max_days: DEFAULT_STREAK_MAX_DAYS,
            min_bet: DEFAULT_MIN_BET,
            max_bet: DEFAULT_MAX_BET,
            board_size: DEFAULT_BOARD_SIZE,
            blocklist: Vec::new(),
            ai_max_turns: DEFAULT_AI_MAX_TURNS,
            ai_idle: Duration::from_secs(DEFAULT_AI_IDLE_SECONDS),
            completion_api_url: None,
            completion_api_key: None,
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.max_warnings, 3);
        assert_eq!(s.spam_gap.as_millis(), 1000);
        assert_eq!(s.spam_burst_limit, 5);
        assert_eq!(s.verification_timeout.as_secs(), 300);
        assert!(s.daily_min <= s.daily_max);
        assert!(s.min_bet <= s.max_bet);
        assert!(s.board_size >= 5);
    }
}
