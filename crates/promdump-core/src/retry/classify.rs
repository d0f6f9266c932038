//! Classify curl errors and attempt failures into retry outcome kinds.

use std::time::Duration;

use super::error::AttemptError;
use super::policy::OutcomeKind;

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> OutcomeKind {
    if e.is_operation_timedout() {
        OutcomeKind::Timeout
    } else {
        OutcomeKind::OtherError
    }
}

/// Convert a curl error from `perform` into an attempt error, folding
/// deadline expiry into `AttemptError::Timeout`.
pub fn attempt_error_from_curl(e: curl::Error, timeout: Duration) -> AttemptError {
    match classify_curl_error(&e) {
        OutcomeKind::Timeout => AttemptError::Timeout(timeout),
        _ => AttemptError::Curl(e),
    }
}

/// Classify a failed attempt into an outcome kind.
pub fn classify(e: &AttemptError) -> OutcomeKind {
    match e {
        AttemptError::Timeout(_) => OutcomeKind::Timeout,
        AttemptError::Curl(ce) => classify_curl_error(ce),
        AttemptError::Http { .. }
        | AttemptError::Decode(_)
        | AttemptError::UnexpectedResults(_) => OutcomeKind::OtherError,
    }
}
