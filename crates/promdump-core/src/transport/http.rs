//! Remote-read POST over libcurl.
//!
//! Each attempt uses a fresh `Easy` handle, so a timed-out transfer is torn
//! down with its handle and nothing leaks into the next attempt.

use std::time::Duration;

use url::Url;

use super::{EndpointError, RawResponse, Transport, TransportConfig};
use crate::retry::{attempt_error_from_curl, AttemptError};

/// Protocol version header expected by remote-read endpoints.
pub const REMOTE_READ_VERSION: &str = "0.1.0";

const USER_AGENT: &str = concat!("promdump/", env!("CARGO_PKG_VERSION"));

/// Blocking transport backed by the curl crate.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    endpoint: Url,
    settings: TransportConfig,
}

impl CurlTransport {
    pub fn new(endpoint: &str, settings: TransportConfig) -> Result<Self, EndpointError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(EndpointError::Empty);
        }
        let endpoint = Url::parse(endpoint)?;
        match endpoint.scheme() {
            "http" | "https" => {}
            other => return Err(EndpointError::Scheme(other.to_string())),
        }
        Ok(Self { endpoint, settings })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            "Content-Encoding: snappy".to_string(),
            "Accept-Encoding: snappy".to_string(),
            "Content-Type: application/x-protobuf".to_string(),
            format!("User-Agent: {USER_AGENT}"),
            format!("X-Prometheus-Remote-Read-Version: {REMOTE_READ_VERSION}"),
            // Send the body immediately instead of waiting for 100-continue.
            "Expect:".to_string(),
        ];
        if let Some(token) = &self.settings.bearer_token {
            headers.push(format!("Authorization: Bearer {}", token.trim()));
        }
        headers
    }

    fn configure(
        &self,
        easy: &mut curl::easy::Easy,
        body: &[u8],
        deadline: Duration,
    ) -> Result<(), curl::Error> {
        easy.url(self.endpoint.as_str())?;
        easy.post(true)?;
        easy.post_fields_copy(body)?;
        easy.timeout(deadline)?;
        easy.connect_timeout(self.settings.connect_timeout.min(deadline))?;

        let mut list = curl::easy::List::new();
        for h in self.headers() {
            list.append(&h)?;
        }
        easy.http_headers(list)?;

        if let Some(auth) = &self.settings.basic_auth {
            easy.username(&auth.username)?;
            easy.password(&auth.password)?;
        }
        if let Some(ca) = &self.settings.ca_file {
            easy.cainfo(ca)?;
        }
        if self.settings.insecure_skip_verify {
            easy.ssl_verify_peer(false)?;
            easy.ssl_verify_host(false)?;
        }
        if let Some(proxy) = &self.settings.proxy_url {
            easy.proxy(proxy)?;
        }
        Ok(())
    }
}

impl Transport for CurlTransport {
    fn post(&self, body: &[u8], deadline: Duration) -> Result<RawResponse, AttemptError> {
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, body, deadline)?;

        let mut response = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer
                .perform()
                .map_err(|e| attempt_error_from_curl(e, deadline))?;
        }

        let status = easy.response_code()?;
        tracing::debug!(
            endpoint = %self.endpoint,
            status,
            bytes = response.len(),
            "remote read exchange finished"
        );
        Ok(RawResponse {
            status,
            body: response,
        })
    }
}

/// First bytes of an error body, for messages.
pub(crate) fn body_excerpt(body: &[u8]) -> String {
    const MAX: usize = 256;
    let cut = &body[..body.len().min(MAX)];
    let text = String::from_utf8_lossy(cut);
    let text = text.trim();
    if body.len() > MAX {
        format!("{text}...")
    } else {
        text.to_string()
    }
}
