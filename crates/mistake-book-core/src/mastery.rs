//! Mastery engine.
//!
//! Decides, for a single answer submission, the next streak, wrong count
//! and mastered flag of a mistake record. The transition is a pure function
//! of the prior state, the outcome, and the policy's threshold:
//!
//! | Outcome | `next_streak` | `next_wrong_count` |
//! |---------|---------------|--------------------|
//! | correct | `prior + 1` | unchanged |
//! | incorrect | `0` | `prior + 1` |
//!
//! `mastered` is `next_streak >= threshold`. `last_seen_at` is always
//! refreshed.

use chrono::{DateTime, Utc};

/// Consecutive correct answers needed before a question counts as mastered.
pub const MASTERY_THRESHOLD: u32 = 3;

/// Mastery rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasteryPolicy {
    pub threshold: u32,
}

impl Default for MasteryPolicy {
    fn default() -> Self {
        Self {
            threshold: MASTERY_THRESHOLD,
        }
    }
}

/// State computed for a record after one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next_streak: u32,
    pub next_wrong_count: u32,
    pub mastered: bool,
    pub last_seen_at: DateTime<Utc>,
}

impl MasteryPolicy {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn is_mastered(&self, streak: u32) -> bool {
        streak >= self.threshold
    }

    /// Compute the next record state. Total over its inputs.
    pub fn next(
        &self,
        prior_streak: u32,
        prior_wrong_count: u32,
        correct: bool,
        now: DateTime<Utc>,
    ) -> Transition {
        let (next_streak, next_wrong_count) = if correct {
            (prior_streak.saturating_add(1), prior_wrong_count)
        } else {
            (0, prior_wrong_count.saturating_add(1))
        };

        Transition {
            next_streak,
            next_wrong_count,
            mastered: self.is_mastered(next_streak),
            last_seen_at: now,
        }
    }
}

/// [`MasteryPolicy::next`] with the default threshold, stamped with the
/// current time.
pub fn next_state(prior_streak: u32, prior_wrong_count: u32, correct: bool) -> Transition {
    MasteryPolicy::default().next(prior_streak, prior_wrong_count, correct, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn correct_answer_extends_streak() {
        let t = MasteryPolicy::default().next(1, 4, true, t0());
        assert_eq!(t.next_streak, 2);
        assert_eq!(t.next_wrong_count, 4);
        assert!(!t.mastered);
        assert_eq!(t.last_seen_at, t0());
    }

    #[test]
    fn third_correct_answer_masters() {
        let policy = MasteryPolicy::default();
        let mut streak = 0;
        let mut wrong = 1;
        for _ in 0..3 {
            let t = policy.next(streak, wrong, true, t0());
            streak = t.next_streak;
            wrong = t.next_wrong_count;
            assert_eq!(t.mastered, streak >= MASTERY_THRESHOLD);
        }
        assert_eq!(streak, 3);
        assert_eq!(wrong, 1);
        assert!(policy.is_mastered(streak));
    }

    #[test]
    fn incorrect_answer_resets_streak_and_counts_miss() {
        let t = MasteryPolicy::default().next(2, 1, false, t0());
        assert_eq!(t.next_streak, 0);
        assert_eq!(t.next_wrong_count, 2);
        assert!(!t.mastered);
    }

    #[test]
    fn incorrect_answer_on_mastered_state_drops_mastery() {
        let t = MasteryPolicy::default().next(5, 2, false, t0());
        assert_eq!(t.next_streak, 0);
        assert!(!t.mastered);
    }

    #[test]
    fn wrong_count_only_grows_on_misses() {
        let policy = MasteryPolicy::default();
        let outcomes = [false, true, true, false, true, true, true, true, false];
        let (mut streak, mut wrong) = (0u32, 0u32);
        for correct in outcomes {
            let t = policy.next(streak, wrong, correct, t0());
            if correct {
                assert_eq!(t.next_wrong_count, wrong);
            } else {
                assert_eq!(t.next_wrong_count, wrong + 1);
            }
            assert_eq!(t.mastered, t.next_streak >= MASTERY_THRESHOLD);
            streak = t.next_streak;
            wrong = t.next_wrong_count;
        }
        assert_eq!(wrong, 3);
    }

    #[test]
    fn custom_threshold() {
        let policy = MasteryPolicy::new(1);
        assert!(policy.next(0, 1, true, t0()).mastered);

        let strict = MasteryPolicy::new(5);
        assert!(!strict.next(3, 1, true, t0()).mastered);
        assert!(strict.next(4, 1, true, t0()).mastered);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let t = MasteryPolicy::default().next(u32::MAX, u32::MAX, true, t0());
        assert_eq!(t.next_streak, u32::MAX);
        let t = MasteryPolicy::default().next(0, u32::MAX, false, t0());
        assert_eq!(t.next_wrong_count, u32::MAX);
    }

    #[test]
    fn next_state_uses_default_threshold() {
        let before = Utc::now();
        let t = next_state(2, 0, true);
        assert!(t.mastered);
        assert!(t.last_seen_at >= before);
    }
}
