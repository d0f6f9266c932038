use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::{FailureAction, RetryPolicy};
use crate::transport::TransportConfig;

/// Default per-attempt timeout for a read request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retryable failures stop once this many attempts have failed.
    pub max_retries: u32,
    /// Flat delay before every retry, e.g. "5s" or "500ms".
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// "retry" or "abort" when an attempt times out.
    pub on_timeout: FailureAction,
    /// "retry" or "abort" on any other failure.
    pub on_error: FailureAction,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            max_retries: p.max_retries,
            retry_delay: p.delay,
            on_timeout: p.on_timeout,
            on_error: p.on_error,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            on_timeout: self.on_timeout,
            on_error: self.on_error,
            max_retries: self.max_retries,
            delay: self.retry_delay,
        }
    }
}

/// Settings loaded from `~/.config/promdump/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl FileConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }
}

/// Everything the read client needs. Built once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint_url: String,
    /// Hard upper bound on each attempt's wall-clock duration.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub transport: TransportConfig,
}

impl ClientConfig {
    /// Config with the dump tool's defaults: 1 minute timeout, retry on
    /// timeout, abort on error, 5 retries, 5s delay.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// Default config file location, if one exists.
pub fn default_config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("promdump")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Load configuration. An explicit `path` must exist; otherwise the XDG
/// default is used when present and built-in defaults when not.
pub fn load(path: Option<&Path>) -> Result<FileConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path()? {
            Some(p) => p,
            None => return Ok(FileConfig::default()),
        },
    };
    let data = fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: FileConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(cfg)
}

/// Parse a duration like `90s`, `1m`, `1m30s`, `1500ms` or `2h`.
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| format!("invalid duration {s:?}: {e}"))
}
