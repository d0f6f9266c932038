//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::error::AttemptError;
use super::policy::{AbortReason, Action, RetryPolicy};

/// Successful value plus the number of attempts it took.
#[derive(Debug)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Terminal failure of the retry loop.
#[derive(Debug)]
pub struct RetryFailure {
    pub reason: AbortReason,
    /// Attempts made, including the last failed one.
    pub attempts: u32,
    pub last_error: AttemptError,
}

/// Runs `f` until it succeeds or the retry policy says to stop.
///
/// `f` receives the 1-based attempt number. On a retryable failure the
/// calling thread sleeps for the policy's flat delay before the next
/// attempt; attempts never overlap.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<Retried<T>, RetryFailure>
where
    F: FnMut(u32) -> Result<T, AttemptError>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(value) => {
                return Ok(Retried {
                    value,
                    attempts: attempt,
                })
            }
            Err(e) => {
                let kind = classify::classify(&e);
                let reason = match policy.decide(kind, attempt) {
                    Action::RetryAfterDelay(d) => {
                        tracing::warn!(
                            attempt,
                            ?kind,
                            delay_ms = d.as_millis() as u64,
                            error = &e as &(dyn std::error::Error + 'static),
                            "read attempt failed, retrying"
                        );
                        std::thread::sleep(d);
                        attempt += 1;
                        continue;
                    }
                    Action::Abort(reason) => reason,
                    // decide() only returns Return for successes
                    Action::Return => AbortReason::NotRetryable,
                };
                return Err(RetryFailure {
                    reason,
                    attempts: attempt,
                    last_error: e,
                });
            }
        }
    }
}
