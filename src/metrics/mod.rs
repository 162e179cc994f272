//! Metrics collection and exposition.
//!
//! This module provides a concurrency-safe registry of counters, gauges, histograms
//! and summaries, a text renderer for the pull-based exposition format, and the
//! application's own metric set.

mod counter;
mod desc;
mod encoder;
mod error;
mod family;
mod gauge;
mod histogram;
mod process;
mod quantile;
mod recorder;
mod registry;
mod snapshot;
mod summary;
mod sync;

pub use counter::{Counter, CounterVec};
pub use desc::{Desc, MetricKind, Opts};
pub use encoder::{format_float, TextEncoder, TEXT_CONTENT_TYPE};
pub use error::{MetricsError, Result};
pub use gauge::{Gauge, GaugeVec};
pub use histogram::{
    exponential_buckets, linear_buckets, Histogram, HistogramOpts, HistogramTimer,
    HistogramVec, DEFAULT_BUCKETS,
};
pub use process::ProcessCollector;
pub use recorder::{Metrics, MetricsRecorder};
pub use registry::{Collector, Registry};
pub use snapshot::{
    HistogramSnapshot, LabelSet, MetricFamily, Sample, SeriesValue, SummarySnapshot,
};
pub use summary::{
    Summary, SummaryOpts, SummaryVec, DEFAULT_AGE_BUCKETS, DEFAULT_MAX_AGE, DEFAULT_OBJECTIVES,
};
