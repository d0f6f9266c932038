//! Export driver: one read, serialized, gzipped and written to disk.
//!
//! The read runs on tokio's blocking pool because the client parks its
//! thread between retries. Nothing is written unless the read succeeds,
//! and the snapshot is renamed into place only once fully written.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use prost::Message;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::client::{ReadClient, ReadError};
use crate::query::{MetricSelector, QueryError, TimeWindow};
use crate::transport::Transport;

/// Suffix appended to the output name. The payload is a gzip stream, not
/// a zip archive; the suffix is kept so existing restore tooling finds it.
pub const SNAPSHOT_EXTENSION: &str = ".zip";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid request")]
    InvalidRequest(#[from] QueryError),
    #[error("reading from remote endpoint")]
    Read(#[from] ReadError),
    #[error("compressing snapshot")]
    Compress(#[source] std::io::Error),
    #[error("writing snapshot {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("background task failed")]
    Join(#[from] tokio::task::JoinError),
}

/// One export run as requested on the command line.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Unix seconds; `None` or zero is rejected.
    pub start_secs: Option<i64>,
    /// Unix seconds.
    pub end_secs: i64,
    pub metric_regex: String,
    /// Output name without the snapshot suffix.
    pub output: PathBuf,
    /// Accepted for compatibility; reads are always a single request.
    pub concurrent_pull: usize,
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub series: usize,
    pub compressed_bytes: usize,
    pub uncompressed_bytes: usize,
    pub serialized_bytes: usize,
    pub written_bytes: u64,
    pub retries: u32,
}

/// Validate, read once, serialize, compress, write.
pub async fn run_export<T>(
    client: Arc<ReadClient<T>>,
    request: &ExportRequest,
) -> Result<ExportSummary, ExportError>
where
    T: Transport + 'static,
{
    let window = TimeWindow::from_unix_secs(request.start_secs, request.end_secs)?;
    let selector = MetricSelector::new(request.metric_regex.as_str())?;
    if request.concurrent_pull > 1 {
        tracing::warn!(
            concurrent_pull = request.concurrent_pull,
            "concurrent pull is not supported, reading as a single request"
        );
    }

    let read = tokio::task::spawn_blocking(move || client.read(&window, &[selector]))
        .await??;
    tracing::info!(
        compressed_bytes = read.compressed_bytes,
        uncompressed_bytes = read.uncompressed_bytes,
        retries = read.retries(),
        "response received"
    );
    let series = read.response.timeseries.len();
    tracing::info!(count = series, "time-series received");

    let serialized = read.response.encode_to_vec();
    let compressed = compress_snapshot(&serialized).map_err(ExportError::Compress)?;

    let path = snapshot_path(&request.output);
    let written_bytes = tokio::task::spawn_blocking({
        let path = path.clone();
        move || write_snapshot(&path, &compressed)
    })
    .await??;
    tracing::info!(path = %path.display(), "written {} bytes", written_bytes);

    Ok(ExportSummary {
        path,
        series,
        compressed_bytes: read.compressed_bytes,
        uncompressed_bytes: read.uncompressed_bytes,
        serialized_bytes: serialized.len(),
        written_bytes,
        retries: read.retries(),
    })
}

/// `output` with the snapshot suffix appended (never replaced).
pub fn snapshot_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(SNAPSHOT_EXTENSION);
    PathBuf::from(name)
}

/// `default_dump_` followed by ten random ASCII letters.
pub fn default_output_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .filter(char::is_ascii_alphabetic)
        .take(10)
        .collect();
    format!("default_dump_{suffix}")
}

/// Gzip `serialized` into a complete stream (header, body, trailer).
pub fn compress_snapshot(serialized: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(serialized)?;
    encoder.finish()
}

/// Write `data` to `path` through a temp file in the same directory, so
/// a failed write never leaves a truncated snapshot behind.
pub fn write_snapshot(path: &Path, data: &[u8]) -> Result<u64, ExportError> {
    let wrap = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(data).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(data.len() as u64)
}
