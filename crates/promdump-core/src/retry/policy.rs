use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classification of a finished attempt for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The endpoint answered and the response decoded.
    Success,
    /// The attempt hit the per-attempt deadline.
    Timeout,
    /// Any other transport or protocol failure.
    OtherError,
}

/// What to do when an attempt fails with a given kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureAction {
    /// Wait the flat delay and try again, while the budget lasts.
    Retry,
    /// Stop on the first failure of this kind.
    Abort,
}

/// Why the policy stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The failure class is retryable but the budget is used up.
    RetriesExhausted,
    /// The failure class is configured to abort.
    NotRetryable,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Hand the successful value to the caller.
    Return,
    /// Sleep for the given delay, then run the next attempt.
    RetryAfterDelay(Duration),
    /// Give up.
    Abort(AbortReason),
}

/// Bounded retry with a flat delay and separate behavior for timeouts and
/// other errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Action taken when an attempt times out.
    pub on_timeout: FailureAction,
    /// Action taken on any other failure.
    pub on_error: FailureAction,
    /// Retryable failures abort once the failed attempt number reaches this.
    pub max_retries: u32,
    /// Flat wait applied before every retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            on_timeout: FailureAction::Retry,
            on_error: FailureAction::Abort,
            max_retries: 5,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Decide what follows the attempt that just completed.
    ///
    /// `attempt` is 1-based (1 = first attempt). The first attempt always
    /// runs, so `max_retries = 0` still yields exactly one attempt.
    pub fn decide(&self, kind: OutcomeKind, attempt: u32) -> Action {
        let action = match kind {
            OutcomeKind::Success => return Action::Return,
            OutcomeKind::Timeout => self.on_timeout,
            OutcomeKind::OtherError => self.on_error,
        };

        match action {
            FailureAction::Abort => Action::Abort(AbortReason::NotRetryable),
            FailureAction::Retry if attempt < self.max_retries => {
                Action::RetryAfterDelay(self.delay)
            }
            FailureAction::Retry => Action::Abort(AbortReason::RetriesExhausted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(on_timeout: FailureAction, on_error: FailureAction, max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            on_timeout,
            on_error,
            max_retries,
            delay: Duration::from_millis(250),
        }
    }

    #[test]
    fn default_matches_dump_tool_settings() {
        let p = RetryPolicy::default();
        assert_eq!(p.on_timeout, FailureAction::Retry);
        assert_eq!(p.on_error, FailureAction::Abort);
        assert_eq!(p.max_retries, 5);
        assert_eq!(p.delay, Duration::from_secs(5));
    }

    #[test]
    fn timeout_retries_below_budget_then_exhausts() {
        let p = policy(FailureAction::Retry, FailureAction::Abort, 5);
        for attempt in 1..5 {
            assert_eq!(
                p.decide(OutcomeKind::Timeout, attempt),
                Action::RetryAfterDelay(Duration::from_millis(250)),
                "attempt {attempt}"
            );
        }
        assert_eq!(
            p.decide(OutcomeKind::Timeout, 5),
            Action::Abort(AbortReason::RetriesExhausted)
        );
        assert_eq!(
            p.decide(OutcomeKind::Timeout, 9),
            Action::Abort(AbortReason::RetriesExhausted)
        );
    }

    #[test]
    fn success_always_returns() {
        let configs = [
            policy(FailureAction::Retry, FailureAction::Retry, 0),
            policy(FailureAction::Abort, FailureAction::Abort, 3),
            policy(FailureAction::Retry, FailureAction::Abort, 5),
        ];
        for p in configs {
            for attempt in [1, 2, 5, 100] {
                assert_eq!(p.decide(OutcomeKind::Success, attempt), Action::Return);
            }
        }
    }

    #[test]
    fn error_abort_stops_on_first_attempt() {
        let p = RetryPolicy::default();
        assert_eq!(
            p.decide(OutcomeKind::OtherError, 1),
            Action::Abort(AbortReason::NotRetryable)
        );
    }

    #[test]
    fn timeout_abort_stops_on_first_attempt() {
        let p = policy(FailureAction::Abort, FailureAction::Retry, 5);
        assert_eq!(
            p.decide(OutcomeKind::Timeout, 1),
            Action::Abort(AbortReason::NotRetryable)
        );
        // Errors still follow their own setting.
        assert!(matches!(
            p.decide(OutcomeKind::OtherError, 1),
            Action::RetryAfterDelay(_)
        ));
    }

    #[test]
    fn error_retry_uses_same_budget_rule() {
        let p = policy(FailureAction::Abort, FailureAction::Retry, 2);
        assert!(matches!(
            p.decide(OutcomeKind::OtherError, 1),
            Action::RetryAfterDelay(_)
        ));
        assert_eq!(
            p.decide(OutcomeKind::OtherError, 2),
            Action::Abort(AbortReason::RetriesExhausted)
        );
    }

    #[test]
    fn zero_budget_aborts_after_first_attempt() {
        let p = policy(FailureAction::Retry, FailureAction::Retry, 0);
        assert_eq!(
            p.decide(OutcomeKind::Timeout, 1),
            Action::Abort(AbortReason::RetriesExhausted)
        );
        assert_eq!(
            p.decide(OutcomeKind::OtherError, 1),
            Action::Abort(AbortReason::RetriesExhausted)
        );
    }

    #[test]
    fn delay_is_flat() {
        let p = policy(FailureAction::Retry, FailureAction::Retry, 50);
        let delays: Vec<_> = (1..10)
            .map(|a| match p.decide(OutcomeKind::Timeout, a) {
                Action::RetryAfterDelay(d) => d,
                other => panic!("expected retry, got {other:?}"),
            })
            .collect();
        assert!(delays.iter().all(|d| *d == Duration::from_millis(250)));
    }
}
