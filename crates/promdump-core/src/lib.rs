pub mod config;
pub mod logging;

pub mod client;
pub mod export;
pub mod prompb;
pub mod query;
pub mod retry;
pub mod transport;

pub use client::{ReadClient, ReadError, ReadResult};
pub use config::ClientConfig;
pub use query::{MetricSelector, TimeWindow};
