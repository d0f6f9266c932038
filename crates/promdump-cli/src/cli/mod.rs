//! CLI for the promdump snapshot tool.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use promdump_core::client::ReadClient;
use promdump_core::config::{self, ClientConfig};
use promdump_core::export::{self, ExportRequest};
use promdump_core::logging::LogFormat;
use promdump_core::transport::{BasicAuth, TransportConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Dump a time range of metrics from a Prometheus remote-read endpoint
/// into a gzip-compressed snapshot file.
#[derive(Debug, Parser)]
#[command(name = "promdump", version)]
#[command(about = "Dump remote-read metric samples to a compressed snapshot", long_about = None)]
pub struct Cli {
    /// URL of read storage (remote-read endpoint).
    #[arg(long, value_name = "URL")]
    pub reader_url: String,

    /// Name of the output file for storing the dump; `.zip` is appended.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Regex for metric names to fetch. By default, fetches all metrics.
    #[arg(long, default_value = promdump_core::query::MATCH_ALL, value_name = "REGEX")]
    pub metric_regex: String,

    /// Timeout for each read attempt (e.g. 30s, 1m, 1m30s).
    #[arg(long, default_value = "1m", value_parser = config::parse_duration)]
    pub timeout: Duration,

    /// Number of concurrent pulls for fetching a metric.
    #[arg(
        long,
        default_value = "1",
        value_name = "N",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub concurrent_pull: u16,

    /// Start time in unix seconds for fetching data (required, non-zero).
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub start: Option<i64>,

    /// End time in unix seconds for fetching data. Defaults to now.
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub end: Option<i64>,

    /// Config file with a `[retry]` section (default: ~/.config/promdump/config.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Bearer token sent in the Authorization header.
    #[arg(
        long,
        value_name = "TOKEN",
        env = "PROMDUMP_BEARER_TOKEN",
        hide_env_values = true
    )]
    pub bearer_token: Option<String>,

    /// Basic auth user name.
    #[arg(long, value_name = "USER", requires = "basic_auth_password")]
    pub basic_auth_user: Option<String>,

    /// Basic auth password.
    #[arg(
        long,
        value_name = "PASSWORD",
        env = "PROMDUMP_BASIC_AUTH_PASSWORD",
        hide_env_values = true
    )]
    pub basic_auth_password: Option<String>,

    /// PEM CA bundle used to verify the endpoint.
    #[arg(long, value_name = "PATH")]
    pub ca_file: Option<PathBuf>,

    /// Skip TLS certificate verification.
    #[arg(long)]
    pub insecure_skip_verify: bool,

    /// Proxy URL for the read request.
    #[arg(long, value_name = "URL")]
    pub proxy_url: Option<String>,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    /// Append logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(f: LogFormatArg) -> Self {
        match f {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Cli {
    pub fn log_format(&self) -> LogFormat {
        self.log_format.into()
    }

    fn transport_config(&self) -> TransportConfig {
        let basic_auth = match (&self.basic_auth_user, &self.basic_auth_password) {
            (Some(username), Some(password)) => Some(BasicAuth {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };
        TransportConfig {
            basic_auth,
            bearer_token: self.bearer_token.clone(),
            ca_file: self.ca_file.clone(),
            insecure_skip_verify: self.insecure_skip_verify,
            proxy_url: self.proxy_url.clone(),
            ..TransportConfig::default()
        }
    }

    fn client_config(&self, file: &config::FileConfig) -> ClientConfig {
        let mut cfg = ClientConfig::new(self.reader_url.clone());
        cfg.timeout = self.timeout;
        cfg.retry = file.retry_policy();
        cfg.transport = self.transport_config();
        cfg
    }

    fn export_request(&self) -> Result<ExportRequest> {
        let end_secs = match self.end {
            Some(e) => e,
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .context("system clock is before the Unix epoch")?
                .as_secs() as i64,
        };
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(export::default_output_name()));
        Ok(ExportRequest {
            start_secs: self.start,
            end_secs,
            metric_regex: self.metric_regex.clone(),
            output,
            concurrent_pull: usize::from(self.concurrent_pull),
        })
    }

    /// Run one export with these arguments.
    pub async fn run(self) -> Result<()> {
        let file_cfg = config::load(self.config.as_deref())?;
        let client_cfg = self.client_config(&file_cfg);
        let request = self.export_request()?;
        tracing::info!(
            reader_url = %client_cfg.endpoint_url,
            timeout = ?client_cfg.timeout,
            retry = ?client_cfg.retry,
            request = ?request,
            "initializing"
        );

        let client = ReadClient::new(&client_cfg).context("creating client")?;
        let summary = export::run_export(Arc::new(client), &request).await?;
        tracing::debug!(?summary, "export finished");
        Ok(())
    }
}
