use tracing::info;

use crate::bot::error::Error;
use crate::config::Settings;
use crate::platform::{ChatId, ChatPlatform, UserId};
use crate::services::economy::Ledger;

/// Result of an escalation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningOutcome {
    /// Below the threshold; `count`/`max` for the progress notice.
    Warned { count: u32, max: u32 },
    /// Threshold reached: the user was banned and the counter reset.
    Banned,
}

/// Add one warning and escalate to a ban at the configured threshold. The
/// counter is cleared only after the ban call succeeds; if the platform
/// rejects the ban the count stays at the threshold and the error surfaces;
/// the earlier increment is not rolled back.
pub async fn add_warning(
    platform: &dyn ChatPlatform,
    ledger: &Ledger,
    settings: &Settings,
    chat: ChatId,
    user: UserId,
) -> Result<WarningOutcome, Error> {
    let count = ledger.add_warning(user);

    if count >= settings.max_warnings {
        platform.ban_member(chat, user).await?;
        ledger.clear_warnings(user);
        info!(chat = chat.0, user = user.0, "user banned at warning limit");
        return Ok(WarningOutcome::Banned);
    }

    info!(
        chat = chat.0,
        user = user.0,
        count,
        max = settings.max_warnings,
        "warning added"
    );
    Ok(WarningOutcome::Warned {
        count,
        max: settings.max_warnings,
    })
}

/// Remove one warning, flooring at zero.
pub fn remove_warning(ledger: &Ledger, user: UserId) -> u32 {
    ledger.remove_warning(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;

    const CHAT: ChatId = ChatId(77);
    const USER: UserId = UserId(5);

    #[tokio::test]
    async fn two_warnings_do_not_ban() {
        let platform = MockPlatform::new();
        let ledger = Ledger::new();
        let settings = Settings::default();

        for expected in 1..=2 {
            let outcome = add_warning(&platform, &ledger, &settings, CHAT, USER)
                .await
                .unwrap();
            assert_eq!(
                outcome,
                WarningOutcome::Warned {
                    count: expected,
                    max: 3
                }
            );
        }
        assert_eq!(platform.ban_count(CHAT, USER), 0);
    }

    #[tokio::test]
    async fn third_warning_bans_exactly_once_and_resets() {
        let platform = MockPlatform::new();
        let ledger = Ledger::new();
        let settings = Settings::default();

        add_warning(&platform, &ledger, &settings, CHAT, USER).await.unwrap();
        add_warning(&platform, &ledger, &settings, CHAT, USER).await.unwrap();
        let outcome = add_warning(&platform, &ledger, &settings, CHAT, USER)
            .await
            .unwrap();

        assert_eq!(outcome, WarningOutcome::Banned);
        assert_eq!(platform.ban_count(CHAT, USER), 1);
        // counter starts fresh if the user rejoins
        assert_eq!(ledger.warnings(USER), 0);
    }

    #[tokio::test]
    async fn remove_warning_floors_at_zero() {
        let platform = MockPlatform::new();
        let ledger = Ledger::new();
        let settings = Settings::default();

        assert_eq!(remove_warning(&ledger, USER), 0);
        add_warning(&platform, &ledger, &settings, CHAT, USER).await.unwrap();
        assert_eq!(remove_warning(&ledger, USER), 0);
    }
}
