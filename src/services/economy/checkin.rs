use chrono::NaiveDate;
use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::config::Settings;
use crate::constants::defaults::STREAK_MILESTONES;
use crate::platform::UserId;

use super::ledger::{Achievement, Ledger};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CheckInError {
    #[error("already checked in today")]
    AlreadyCheckedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInOutcome {
    /// Random base reward
    pub base: i64,
    /// Flat streak bonus (0 on the first day of a streak)
    pub streak_bonus: i64,
    /// One-time bonus for crossing a streak milestone today
    pub milestone_bonus: i64,
    pub streak: u32,
    pub total_check_ins: u32,
    pub balance: i64,
    pub new_achievements: Vec<Achievement>,
}

impl CheckInOutcome {
    pub fn reward(&self) -> i64 {
        self.base + self.streak_bonus + self.milestone_bonus
    }
}

/// Roll the uniform daily reward.
pub fn roll_daily(settings: &Settings) -> i64 {
    rand::thread_rng().gen_range(settings.daily_min..=settings.daily_max)
}

/// Perform the daily check-in for `today`. At most one check-in per calendar
/// day; a check-in on the day after the previous one extends the streak
/// (capped at `streak_max_days`), anything later restarts it at 1. The whole
/// update runs inside one ledger entry lock.
pub fn check_in(
    ledger: &Ledger,
    settings: &Settings,
    user: UserId,
    today: NaiveDate,
    base_roll: i64,
) -> Result<CheckInOutcome, CheckInError> {
    let outcome = ledger.with(user, |rec| {
        if rec.last_check_in == Some(today) {
            return Err(CheckInError::AlreadyCheckedIn);
        }

        let yesterday = today.pred_opt();
        let previous_streak = rec.check_in_streak;
        rec.check_in_streak = if yesterday.is_some() && rec.last_check_in == yesterday {
            (rec.check_in_streak + 1).min(settings.streak_max_days)
        } else {
            1
        };
        rec.last_check_in = Some(today);
        rec.total_check_ins += 1;

        let streak_bonus = if rec.check_in_streak > 1 {
            settings.streak_bonus
        } else {
            0
        };

        // A milestone pays exactly once: when the counter lands on the
        // threshold. The counter is capped, so the extra transition check
        // keeps a pinned streak from re-paying the cap milestone daily.
        let milestone_bonus = if rec.check_in_streak != previous_streak {
            STREAK_MILESTONES
                .iter()
                .find(|(days, _)| *days == rec.check_in_streak)
                .map(|(_, bonus)| *bonus)
                .unwrap_or(0)
        } else {
            0
        };

        rec.points += base_roll + streak_bonus + milestone_bonus;

        let mut new_achievements = Vec::new();
        for (total, achievement) in [
            (7, Achievement::CheckIns7),
            (30, Achievement::CheckIns30),
            (100, Achievement::CheckIns100),
            (365, Achievement::CheckIns365),
        ] {
            if rec.total_check_ins == total && rec.achievements.insert(achievement) {
                new_achievements.push(achievement);
            }
        }

        Ok(CheckInOutcome {
            base: base_roll,
            streak_bonus,
            milestone_bonus,
            streak: rec.check_in_streak,
            total_check_ins: rec.total_check_ins,
            balance: rec.points,
            new_achievements,
        })
    })?;

    info!(
        user = user.0,
        reward = outcome.reward(),
        streak = outcome.streak,
        "daily check-in"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId(9);

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(n))
            .unwrap()
    }

    #[test]
    fn second_check_in_same_day_is_rejected() {
        let ledger = Ledger::new();
        let settings = Settings::default();
        check_in(&ledger, &settings, USER, day(0), 10).unwrap();
        let before = ledger.points(USER);
        assert_eq!(
            check_in(&ledger, &settings, USER, day(0), 10),
            Err(CheckInError::AlreadyCheckedIn)
        );
        assert_eq!(ledger.points(USER), before);
    }

    #[test]
    fn consecutive_days_extend_the_streak() {
        let ledger = Ledger::new();
        let settings = Settings::default();
        let first = check_in(&ledger, &settings, USER, day(0), 10).unwrap();
        assert_eq!(first.streak, 1);
        assert_eq!(first.streak_bonus, 0);

        let second = check_in(&ledger, &settings, USER, day(1), 10).unwrap();
        assert_eq!(second.streak, 2);
        assert_eq!(second.streak_bonus, settings.streak_bonus);
    }

    #[test]
    fn skipping_a_day_resets_the_streak() {
        let ledger = Ledger::new();
        let settings = Settings::default();
        check_in(&ledger, &settings, USER, day(0), 10).unwrap();
        check_in(&ledger, &settings, USER, day(1), 10).unwrap();
        let resumed = check_in(&ledger, &settings, USER, day(3), 10).unwrap();
        assert_eq!(resumed.streak, 1);
        assert_eq!(resumed.streak_bonus, 0);
        assert_eq!(resumed.total_check_ins, 3);
    }

    #[test]
    fn streak_milestone_pays_exactly_once() {
        let ledger = Ledger::new();
        let settings = Settings::default();
        let mut bonuses = Vec::new();
        for n in 0..5 {
            bonuses.push(check_in(&ledger, &settings, USER, day(n), 0).unwrap().milestone_bonus);
        }
        // milestone at streak 3 only
        assert_eq!(bonuses, vec![0, 0, 50, 0, 0]);
    }

    #[test]
    fn capped_streak_does_not_repay_the_cap_milestone() {
        let ledger = Ledger::new();
        let settings = Settings::default();
        let mut last = None;
        for n in 0..10 {
            last = Some(check_in(&ledger, &settings, USER, day(n), 0).unwrap());
        }
        let last = last.unwrap();
        assert_eq!(last.streak, settings.streak_max_days);
        assert_eq!(last.milestone_bonus, 0);
        // 3-day (50) and 7-day (100) milestones paid once each; streak bonus
        // from day 2 onward.
        assert_eq!(ledger.points(USER), 50 + 100 + 9 * settings.streak_bonus);
    }

    #[test]
    fn cumulative_milestones_grant_achievements_once() {
        let ledger = Ledger::new();
        let settings = Settings::default();
        let mut granted = Vec::new();
        for n in 0..8 {
            let out = check_in(&ledger, &settings, USER, day(n), 0).unwrap();
            granted.extend(out.new_achievements);
        }
        assert_eq!(granted, vec![Achievement::CheckIns7]);
    }
}
