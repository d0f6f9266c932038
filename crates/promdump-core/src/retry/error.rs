//! Error produced by a single read attempt, before retry classification.

use std::time::Duration;

use crate::prompb::DecodeError;

/// Failure of one request/response cycle against the read endpoint.
/// Kept separate from `ReadError` so we can classify and decide retries
/// before surfacing anything to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// The attempt did not finish within the configured deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Curl reported a non-timeout error (connection refused, DNS, TLS, ...).
    #[error("curl transfer failed")]
    Curl(#[from] curl::Error),
    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u32, body: String },
    /// The response body could not be decoded.
    #[error("decoding response")]
    Decode(#[from] DecodeError),
    /// One query was sent; the endpoint must return exactly one result.
    #[error("expected 1 query result, got {0}")]
    UnexpectedResults(usize),
}
