//! Resilient remote-read client.
//!
//! Builds the snappy-framed request once, then delivers it through the
//! transport under the retry policy. Each attempt is bounded by the
//! configured timeout; a read either returns the whole response or fails.

use std::time::Duration;

use crate::config::ClientConfig;
use crate::prompb::{decode_read_response, encode_read_request, QueryResult};
use crate::query::{build_read_request, MetricSelector, QueryError, TimeWindow};
use crate::retry::{run_with_retry, AbortReason, AttemptError, RetryFailure, RetryPolicy};
use crate::transport::{body_excerpt, CurlTransport, EndpointError, Transport};

/// Terminal error of a read.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Window or selector rejected before any network attempt.
    #[error("invalid request")]
    InvalidRequest(#[from] QueryError),
    #[error("invalid client config")]
    InvalidEndpoint(#[from] EndpointError),
    #[error("invalid client config: timeout must be positive")]
    InvalidTimeout,
    /// A retryable failure persisted past the retry budget.
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last_error: AttemptError,
    },
    /// The failure class is configured not to retry.
    #[error("aborted on attempt {attempt}")]
    Aborted { attempt: u32, source: AttemptError },
}

impl From<RetryFailure> for ReadError {
    fn from(f: RetryFailure) -> Self {
        match f.reason {
            AbortReason::RetriesExhausted => ReadError::RetriesExhausted {
                attempts: f.attempts,
                last_error: f.last_error,
            },
            AbortReason::NotRetryable => ReadError::Aborted {
                attempt: f.attempts,
                source: f.last_error,
            },
        }
    }
}

/// Decoded response plus transfer-size telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    pub response: QueryResult,
    /// Body size on the wire (snappy-compressed).
    pub compressed_bytes: usize,
    /// Body size after snappy decompression.
    pub uncompressed_bytes: usize,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

impl ReadResult {
    /// Retries consumed before the successful attempt.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Remote-read client. Safe to reuse for sequential reads and to share
/// between threads; it holds no per-read state.
#[derive(Debug)]
pub struct ReadClient<T = CurlTransport> {
    transport: T,
    timeout: Duration,
    policy: RetryPolicy,
}

impl ReadClient<CurlTransport> {
    /// Client over libcurl for `config.endpoint_url`.
    pub fn new(config: &ClientConfig) -> Result<Self, ReadError> {
        let transport = CurlTransport::new(&config.endpoint_url, config.transport.clone())?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> ReadClient<T> {
    /// Client over a caller-supplied transport. The endpoint URL in
    /// `config` is ignored; the transport owns addressing.
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self, ReadError> {
        if config.timeout.is_zero() {
            return Err(ReadError::InvalidTimeout);
        }
        Ok(Self {
            transport,
            timeout: config.timeout,
            policy: config.retry,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read every series matching `selectors` inside `window`.
    pub fn read(
        &self,
        window: &TimeWindow,
        selectors: &[MetricSelector],
    ) -> Result<ReadResult, ReadError> {
        let request = build_read_request(window, selectors)?;
        let payload = encode_read_request(&request).map_err(QueryError::Encode)?;
        tracing::debug!(
            start_ms = window.start_ms(),
            end_ms = window.end_ms(),
            request_bytes = payload.len(),
            "sending remote read request"
        );

        let done = run_with_retry(&self.policy, |attempt| {
            tracing::debug!(
                attempt,
                timeout_ms = self.timeout.as_millis() as u64,
                "read attempt"
            );
            self.attempt(&payload)
        })?;

        let (response, compressed_bytes, uncompressed_bytes) = done.value;
        Ok(ReadResult {
            response,
            compressed_bytes,
            uncompressed_bytes,
            attempts: done.attempts,
        })
    }

    fn attempt(&self, payload: &[u8]) -> Result<(QueryResult, usize, usize), AttemptError> {
        let raw = self.transport.post(payload, self.timeout)?;
        if !raw.is_success() {
            return Err(AttemptError::Http {
                status: raw.status,
                body: body_excerpt(&raw.body),
            });
        }
        let (mut resp, uncompressed) = decode_read_response(&raw.body)?;
        if resp.results.len() != 1 {
            return Err(AttemptError::UnexpectedResults(resp.results.len()));
        }
        let result = resp.results.swap_remove(0);
        Ok((result, raw.body.len(), uncompressed))
    }
}
