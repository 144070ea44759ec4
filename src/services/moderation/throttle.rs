use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::platform::UserId;

#[derive(Debug, Clone, Copy)]
struct SpamState {
    last_message_at: Instant,
    burst_count: u32,
}

/// What to do with the message that was just evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Process normally.
    Clean,
    /// Delete the message, post a warning notice, and skip normal handling.
    Throttled,
}

/// Per-user message-rate throttle. The policy is not a sliding window: the
/// burst counter grows only while every gap stays under the
/// threshold, and a single slow message forgives the whole burst.
pub struct SpamTracker {
    states: DashMap<UserId, SpamState>,
    gap: Duration,
    burst_limit: u32,
}

impl SpamTracker {
    pub fn new(gap: Duration, burst_limit: u32) -> Self {
        Self {
            states: DashMap::new(),
            gap,
            burst_limit,
        }
    }

    /// Evaluate one inbound message. `now` is injected so tests control the
    /// clock; handlers pass `Instant::now()`. The read-modify-write runs
    /// under the user's entry lock.
    pub fn check(&self, user: UserId, now: Instant) -> Verdict {
        let mut entry = self.states.entry(user).or_insert(SpamState {
            last_message_at: now - self.gap,
            burst_count: 0,
        });
        let state = entry.value_mut();

        let verdict = if now.duration_since(state.last_message_at) < self.gap {
            state.burst_count += 1;
            if state.burst_count >= self.burst_limit {
                debug!(user = user.0, "spam burst limit hit");
                state.burst_count = 0;
                Verdict::Throttled
            } else {
                Verdict::Clean
            }
        } else {
            state.burst_count = 0;
            Verdict::Clean
        };

        state.last_message_at = now;
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId(11);

    fn tracker() -> SpamTracker {
        SpamTracker::new(Duration::from_millis(1000), 5)
    }

    #[test]
    fn five_rapid_follow_ups_trigger_the_throttle() {
        let tracker = tracker();
        let start = Instant::now();
        assert_eq!(tracker.check(USER, start), Verdict::Clean);
        // burst counter climbs 1..4 on the next four rapid messages
        for i in 1..=4u64 {
            assert_eq!(
                tracker.check(USER, start + Duration::from_millis(i * 100)),
                Verdict::Clean
            );
        }
        // fifth consecutive sub-gap message crosses the limit
        assert_eq!(
            tracker.check(USER, start + Duration::from_millis(500)),
            Verdict::Throttled
        );
    }

    #[test]
    fn throttling_resets_the_burst_counter() {
        let tracker = tracker();
        let start = Instant::now();
        let mut t = start;
        tracker.check(USER, t);
        let mut throttled = 0;
        for _ in 0..10 {
            t += Duration::from_millis(100);
            if tracker.check(USER, t) == Verdict::Throttled {
                throttled += 1;
            }
        }
        // limit is reached at message 6 and again 5 messages later
        assert_eq!(throttled, 2);
    }

    #[test]
    fn a_slow_message_forgives_the_burst() {
        let tracker = tracker();
        let start = Instant::now();
        tracker.check(USER, start);
        for i in 1..=4u64 {
            tracker.check(USER, start + Duration::from_millis(i * 100));
        }
        // 2 s later: gap test fails once, counter resets to zero
        let calm = start + Duration::from_millis(2400);
        assert_eq!(tracker.check(USER, calm), Verdict::Clean);
        // the next rapid burst starts counting from scratch
        for i in 1..=4u64 {
            assert_eq!(
                tracker.check(USER, calm + Duration::from_millis(i * 100)),
                Verdict::Clean
            );
        }
    }

    #[test]
    fn users_are_throttled_independently() {
        let tracker = tracker();
        let start = Instant::now();
        for i in 0..=5u64 {
            tracker.check(USER, start + Duration::from_millis(i * 100));
        }
        // a different user's first message is clean even at the same instant
        assert_eq!(tracker.check(UserId(12), start + Duration::from_millis(500)), Verdict::Clean);
    }
}
