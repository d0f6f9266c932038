//! Retry policy for remote reads.
//!
//! This module encapsulates outcome classification (timeouts versus other
//! failures) and the flat-delay, bounded-retry decision so the read client
//! never hard-codes when to stop.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{attempt_error_from_curl, classify, classify_curl_error};
pub use error::AttemptError;
pub use policy::{AbortReason, Action, FailureAction, OutcomeKind, RetryPolicy};
pub use run::{run_with_retry, Retried, RetryFailure};
