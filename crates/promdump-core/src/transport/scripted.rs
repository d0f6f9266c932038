//! Scripted transport for unit tests: replays queued outcomes in order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{RawResponse, Transport};
use crate::prompb::{encode_read_response, Label, QueryResult, ReadResponse, Sample, TimeSeries};
use crate::retry::AttemptError;

#[derive(Debug)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, AttemptError>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<RawResponse, AttemptError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn post(&self, _body: &[u8], deadline: Duration) -> Result<RawResponse, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AttemptError::Timeout(deadline)))
    }
}

pub(crate) fn timeout() -> Result<RawResponse, AttemptError> {
    Err(AttemptError::Timeout(Duration::from_secs(1)))
}

pub(crate) fn status(code: u32) -> Result<RawResponse, AttemptError> {
    Ok(RawResponse {
        status: code,
        body: b"internal error".to_vec(),
    })
}

/// `n` series named `metric_<i>`, each with three samples.
pub(crate) fn sample_result(n: usize) -> QueryResult {
    QueryResult {
        timeseries: (0..n)
            .map(|i| TimeSeries {
                labels: vec![Label {
                    name: "__name__".into(),
                    value: format!("metric_{i}"),
                }],
                samples: (1..=3)
                    .map(|t| Sample {
                        value: t as f64,
                        timestamp: 1_000_000 + t * 1_000,
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub(crate) fn ok_with(result: QueryResult) -> Result<RawResponse, AttemptError> {
    let body = encode_read_response(&ReadResponse {
        results: vec![result],
    })
    .unwrap();
    Ok(RawResponse { status: 200, body })
}
