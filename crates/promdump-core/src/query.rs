//! Time window and metric-name selector validation, and read request
//! construction.

use regex::Regex;

use crate::prompb::{label_matcher, LabelMatcher, Query, ReadRequest};

/// Reserved label holding the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Pattern that selects every metric.
pub const MATCH_ALL: &str = ".*";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("start time must be provided and non-zero")]
    MissingStart,
    #[error("start {start_ms}ms is after end {end_ms}ms")]
    StartAfterEnd { start_ms: i64, end_ms: i64 },
    #[error("timestamp {0}s is out of range")]
    OutOfRange(i64),
    #[error("invalid metric regex {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("at least one metric selector is required")]
    NoSelectors,
    #[error("encoding read request")]
    Encode(#[from] snap::Error),
}

/// Inclusive `[start, end]` range in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start_ms: i64,
    end_ms: i64,
}

impl TimeWindow {
    /// Build a window from millisecond timestamps.
    ///
    /// A missing start and a start of exactly zero are both treated as
    /// "not provided"; dumps from the epoch itself must start at 1ms.
    pub fn new(start_ms: Option<i64>, end_ms: i64) -> Result<Self, QueryError> {
        let start_ms = match start_ms {
            Some(0) | None => return Err(QueryError::MissingStart),
            Some(ms) => ms,
        };
        if start_ms > end_ms {
            return Err(QueryError::StartAfterEnd { start_ms, end_ms });
        }
        Ok(Self { start_ms, end_ms })
    }

    /// Build a window from Unix seconds, as given on the command line.
    pub fn from_unix_secs(start: Option<i64>, end: i64) -> Result<Self, QueryError> {
        let to_ms = |s: i64| s.checked_mul(1000).ok_or(QueryError::OutOfRange(s));
        let start_ms = start.map(to_ms).transpose()?;
        Self::new(start_ms, to_ms(end)?)
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }
}

/// Regex matcher on the metric name label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSelector {
    pattern: String,
}

impl MetricSelector {
    /// Validate `pattern` the way the endpoint will apply it: fully anchored.
    pub fn new(pattern: impl Into<String>) -> Result<Self, QueryError> {
        let pattern = pattern.into();
        if let Err(source) = Regex::new(&format!("^(?:{pattern})$")) {
            return Err(QueryError::InvalidPattern { pattern, source });
        }
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn to_matcher(&self) -> LabelMatcher {
        LabelMatcher {
            r#type: label_matcher::Type::Re as i32,
            name: METRIC_NAME_LABEL.to_string(),
            value: self.pattern.clone(),
        }
    }
}

impl Default for MetricSelector {
    fn default() -> Self {
        Self {
            pattern: MATCH_ALL.to_string(),
        }
    }
}

/// Build the single-query read request for `window` and `selectors`.
pub fn build_read_request(
    window: &TimeWindow,
    selectors: &[MetricSelector],
) -> Result<ReadRequest, QueryError> {
    if selectors.is_empty() {
        return Err(QueryError::NoSelectors);
    }
    let query = Query {
        start_timestamp_ms: window.start_ms,
        end_timestamp_ms: window.end_ms,
        matchers: selectors.iter().map(MetricSelector::to_matcher).collect(),
    };
    Ok(ReadRequest {
        queries: vec![query],
    })
}
