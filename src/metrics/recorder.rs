//! The demo application's metric set.

use std::sync::Arc;

use super::counter::{Counter, CounterVec};
use super::desc::Opts;
use super::error::Result;
use super::gauge::Gauge;
use super::histogram::{linear_buckets, Histogram, HistogramOpts, HistogramTimer, HistogramVec};
use super::process::ProcessCollector;
use super::registry::Registry;
use super::summary::{Summary, SummaryOpts, DEFAULT_OBJECTIVES};

/// Trait for recording application metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Advances the heartbeat counter.
    fn record_tick(&self);

    /// Records a successful call to the gauge workload endpoint.
    fn record_gauge_request(&self);

    /// Records a call to the bad-request workload endpoint.
    fn record_bad_request(&self);

    /// Counts a response by status code and method.
    fn record_status(&self, code: u16, method: &str) -> Result<()>;

    /// Feeds a simulated processing time into both the summary and the histogram.
    fn record_processing_time_ms(&self, millis: f64) -> Result<()>;

    /// Starts timing a request to `path`; the duration is observed when the timer ends.
    fn start_http_timer(&self, path: &str) -> Result<HistogramTimer>;
}

/// Metric handles for the demo, all registered on one registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Background generators
    counter: Counter,
    processing_time_summary_ms: Summary,
    processing_time_histogram_ms: Histogram,

    // Workload endpoints
    gauge: Gauge,
    bad_request_gauge: Gauge,
    status_codes: CounterVec,
    http_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Creates a registry with the process collector and every demo metric.
    ///
    /// Any error here means the metric set itself is inconsistent and startup
    /// should be aborted.
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        registry.register(Arc::new(ProcessCollector::new()?))?;

        let counter =
            registry.register_counter(Opts::new("simple_app_counter", "simple_app_counter"))?;

        let gauge = registry.register_gauge(Opts::new("simple_app_gauge", "simple_app_gauge"))?;

        let bad_request_gauge = registry.register_gauge(Opts::new(
            "simple_app_bad_request_gauge",
            "simple_app_bad_request_gauge",
        ))?;

        let status_codes = registry.register_counter_vec(
            Opts::new("simple_app_status_codes", "simple_app_status_codes"),
            &["code", "method"],
        )?;

        let processing_time_summary_ms = registry.register_summary(
            SummaryOpts::new(
                "simple_app_time_summary_ms",
                "Simulated processing time in milliseconds.",
            )
            .objectives(DEFAULT_OBJECTIVES.to_vec()),
        )?;

        let processing_time_histogram_ms = registry.register_histogram(
            HistogramOpts::new(
                "simple_processing_time_histogram_ms",
                "Simulated processing time in milliseconds.",
            )
            .buckets(linear_buckets(0.0, 10.0, 20)),
        )?;

        let http_duration_seconds = registry.register_histogram_vec(
            HistogramOpts::new(
                "simple_app_http_request_duration_seconds",
                "Duration of HTTP requests.",
            ),
            &["path"],
        )?;

        Ok(Metrics {
            registry,
            counter,
            processing_time_summary_ms,
            processing_time_histogram_ms,
            gauge,
            bad_request_gauge,
            status_codes,
            http_duration_seconds,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Renders all metrics in the text exposition format.
    pub fn render(&self) -> String {
        self.registry.render()
    }
}

impl MetricsRecorder for Metrics {
    fn record_tick(&self) {
        self.counter.inc();
    }

    fn record_gauge_request(&self) {
        self.gauge.inc();
    }

    fn record_bad_request(&self) {
        self.bad_request_gauge.inc();
    }

    fn record_status(&self, code: u16, method: &str) -> Result<()> {
        let code = code.to_string();
        self.status_codes
            .with_label_values(&[code.as_str(), method])?
            .inc();
        Ok(())
    }

    fn record_processing_time_ms(&self, millis: f64) -> Result<()> {
        self.processing_time_summary_ms.observe(millis)?;
        self.processing_time_histogram_ms.observe(millis)
    }

    fn start_http_timer(&self, path: &str) -> Result<HistogramTimer> {
        Ok(self
            .http_duration_seconds
            .with_label_values(&[path])?
            .start_timer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SeriesValue;

    #[test]
    fn registers_full_metric_set() {
        let metrics = Metrics::new().expect("demo metrics should register");
        let rendered = metrics.render();

        for name in [
            "process_start_time_seconds",
            "simple_app_counter",
            "simple_app_gauge",
            "simple_app_bad_request_gauge",
            "simple_app_status_codes",
            "simple_app_time_summary_ms",
            "simple_processing_time_histogram_ms",
            "simple_app_http_request_duration_seconds",
        ] {
            assert!(
                rendered.contains(&format!("# TYPE {} ", name)),
                "missing {name}"
            );
        }
    }

    #[test]
    fn processing_time_feeds_summary_and_histogram() {
        let metrics = Metrics::new().unwrap();
        metrics.record_processing_time_ms(105.0).unwrap();
        metrics.record_processing_time_ms(125.0).unwrap();

        let rendered = metrics.render();
        assert!(rendered.contains("simple_processing_time_histogram_ms_bucket{le=\"100\"} 0\n"));
        assert!(rendered.contains("simple_processing_time_histogram_ms_bucket{le=\"110\"} 1\n"));
        assert!(rendered.contains("simple_processing_time_histogram_ms_bucket{le=\"+Inf\"} 2\n"));
        assert!(rendered.contains("simple_app_time_summary_ms_count 2\n"));
        assert!(rendered.contains("simple_app_time_summary_ms_sum 230\n"));
    }

    #[test]
    fn status_codes_are_labeled() {
        let metrics = Metrics::new().unwrap();
        metrics.record_status(200, "GET").unwrap();
        metrics.record_status(200, "GET").unwrap();
        metrics.record_status(400, "GET").unwrap();

        let families = metrics.registry().gather();
        let codes = families
            .iter()
            .find(|f| f.desc.name() == "simple_app_status_codes")
            .unwrap();
        let count = |code: &str| {
            codes
                .sample(&[("method", "GET"), ("code", code)])
                .map(|s| s.value.clone())
        };
        assert_eq!(count("200"), Some(SeriesValue::Counter(2.0)));
        assert_eq!(count("400"), Some(SeriesValue::Counter(1.0)));
        assert_eq!(count("500"), None);
    }
}
