//! The metric registry: unique names, registration order, and snapshots.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::counter::{counter, counter_family, counter_vec, Counter, CounterVec};
use super::desc::{Desc, Opts};
use super::encoder::TextEncoder;
use super::error::{MetricsError, Result};
use super::gauge::{gauge, gauge_family, gauge_vec, Gauge, GaugeVec};
use super::histogram::{
    histogram, histogram_family, histogram_vec, Histogram, HistogramOpts, HistogramVec,
};
use super::snapshot::MetricFamily;
use super::summary::{
    summary, summary_family, summary_vec, Summary, SummaryOpts, SummaryVec,
};
use super::sync::{read, write};

/// Anything that can contribute metric families to a snapshot.
///
/// Built-in metric kinds implement this internally; custom collectors such as
/// [`ProcessCollector`](super::ProcessCollector) implement it to compute values at
/// scrape time.
pub trait Collector: Send + Sync {
    /// Descriptors of every family this collector will ever emit.
    fn descs(&self) -> Vec<Arc<Desc>>;

    /// Current state, one entry per descriptor, in `descs` order.
    fn collect(&self) -> Vec<MetricFamily>;
}

#[derive(Default)]
struct Inner {
    collectors: Vec<Arc<dyn Collector>>,
    names: HashSet<String>,
}

/// Owns the set of registered collectors.
///
/// Typically built once at startup and shared behind an `Arc`.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Registers `collector`, failing if any of its names is already taken.
    ///
    /// On failure the registry is left exactly as it was.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<()> {
        let descs = collector.descs();
        let mut inner = write(&self.inner);

        let mut incoming: HashSet<&str> = HashSet::new();
        for desc in &descs {
            if inner.names.contains(desc.name()) || !incoming.insert(desc.name()) {
                return Err(MetricsError::DuplicateName(desc.name().to_string()));
            }
        }

        for desc in &descs {
            debug!(metric = desc.name(), kind = %desc.kind(), "registered metric");
            inner.names.insert(desc.name().to_string());
        }
        inner.collectors.push(collector);
        Ok(())
    }

    pub fn register_counter(&self, opts: Opts) -> Result<Counter> {
        let family = Arc::new(counter_family(&opts, &[])?);
        self.register(family.clone())?;
        Ok(counter(family))
    }

    pub fn register_counter_vec(&self, opts: Opts, label_names: &[&str]) -> Result<CounterVec> {
        let family = Arc::new(counter_family(&opts, label_names)?);
        self.register(family.clone())?;
        Ok(counter_vec(family))
    }

    pub fn register_gauge(&self, opts: Opts) -> Result<Gauge> {
        let family = Arc::new(gauge_family(&opts, &[])?);
        self.register(family.clone())?;
        Ok(gauge(family))
    }

    pub fn register_gauge_vec(&self, opts: Opts, label_names: &[&str]) -> Result<GaugeVec> {
        let family = Arc::new(gauge_family(&opts, label_names)?);
        self.register(family.clone())?;
        Ok(gauge_vec(family))
    }

    pub fn register_histogram(&self, opts: HistogramOpts) -> Result<Histogram> {
        let family = Arc::new(histogram_family(&opts, &[])?);
        self.register(family.clone())?;
        Ok(histogram(family))
    }

    pub fn register_histogram_vec(
        &self,
        opts: HistogramOpts,
        label_names: &[&str],
    ) -> Result<HistogramVec> {
        let family = Arc::new(histogram_family(&opts, label_names)?);
        self.register(family.clone())?;
        Ok(histogram_vec(family))
    }

    pub fn register_summary(&self, opts: SummaryOpts) -> Result<Summary> {
        let family = Arc::new(summary_family(&opts, &[])?);
        self.register(family.clone())?;
        Ok(summary(family))
    }

    pub fn register_summary_vec(
        &self,
        opts: SummaryOpts,
        label_names: &[&str],
    ) -> Result<SummaryVec> {
        let family = Arc::new(summary_family(&opts, label_names)?);
        self.register(family.clone())?;
        Ok(summary_vec(family))
    }

    /// Collects every family in registration order.
    ///
    /// Each series is read atomically; families are not read as one transaction.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let collectors: Vec<Arc<dyn Collector>> = read(&self.inner).collectors.clone();
        collectors.iter().flat_map(|c| c.collect()).collect()
    }

    /// Renders a snapshot in the text exposition format.
    pub fn render(&self) -> String {
        TextEncoder::new().encode_to_string(&self.gather())
    }
}
