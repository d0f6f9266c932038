//! HTTP transport seam for the read client.
//!
//! The read client only needs "POST these bytes, give me status and body,
//! never take longer than the deadline". `CurlTransport` does this with
//! libcurl; tests substitute scripted transports.

mod http;
#[cfg(test)]
pub(crate) mod scripted;

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::AttemptError;

pub use http::CurlTransport;
pub(crate) use http::body_excerpt;

/// Status and body of one completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One request/response exchange with the read endpoint.
///
/// Implementations must give up once `deadline` has elapsed and report
/// that as `AttemptError::Timeout`. `&self` because a client may be shared
/// across threads; attempts never share mutable state.
pub trait Transport: Send + Sync {
    fn post(&self, body: &[u8], deadline: Duration) -> Result<RawResponse, AttemptError>;
}

/// TLS, auth and proxy settings applied to every connection.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub basic_auth: Option<BasicAuth>,
    pub bearer_token: Option<String>,
    /// PEM bundle used instead of the system trust store.
    pub ca_file: Option<PathBuf>,
    pub insecure_skip_verify: bool,
    pub proxy_url: Option<String>,
    /// Upper bound on connection setup; never exceeds the attempt deadline.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            basic_auth: None,
            bearer_token: None,
            ca_file: None,
            insecure_skip_verify: false,
            proxy_url: None,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("basic_auth", &self.basic_auth)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("ca_file", &self.ca_file)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("proxy_url", &self.proxy_url)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("reader URL is empty")]
    Empty,
    #[error("invalid reader URL")]
    Parse(#[from] url::ParseError),
    #[error("unsupported URL scheme {0:?}, expected http or https")]
    Scheme(String),
}
