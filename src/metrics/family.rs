//! Shared storage for the series of one metric.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::desc::Desc;
use super::error::Result;
use super::registry::Collector;
use super::snapshot::{LabelSet, MetricFamily, Sample, SeriesValue};
use super::sync::{read, write};

/// Per-series state of a metric kind.
pub(crate) trait Series: Send + Sync + 'static {
    fn sample(&self) -> SeriesValue;
}

type Factory<S> = Box<dyn Fn() -> S + Send + Sync>;

/// A descriptor plus every series created for it, keyed by label values.
///
/// Series are never evicted; a label with unbounded values grows this map for the
/// life of the process.
pub(crate) struct Family<S: Series> {
    desc: Arc<Desc>,
    series: RwLock<BTreeMap<Vec<String>, Arc<S>>>,
    new_series: Factory<S>,
}

impl<S: Series> Family<S> {
    /// Creates the family; an unlabeled metric gets its single series immediately.
    pub(crate) fn new(desc: Desc, new_series: impl Fn() -> S + Send + Sync + 'static) -> Self {
        let mut series = BTreeMap::new();
        if desc.label_names().is_empty() {
            series.insert(Vec::new(), Arc::new(new_series()));
        }
        Family {
            desc: Arc::new(desc),
            series: RwLock::new(series),
            new_series: Box::new(new_series),
        }
    }

    pub(crate) fn desc(&self) -> &Arc<Desc> {
        &self.desc
    }

    /// Returns the series for `values`, creating it on first use.
    ///
    /// Creation re-checks under the write lock, so racing callers all end up with
    /// the same series.
    pub(crate) fn get_or_create(&self, values: Vec<String>) -> Arc<S> {
        if let Some(existing) = read(&self.series).get(&values) {
            return existing.clone();
        }
        write(&self.series)
            .entry(values)
            .or_insert_with(|| Arc::new((self.new_series)()))
            .clone()
    }

    pub(crate) fn with_label_values(&self, values: &[&str]) -> Result<Arc<S>> {
        let values = self.desc.resolve_values(values)?;
        Ok(self.get_or_create(values))
    }

    pub(crate) fn with(&self, pairs: &[(&str, &str)]) -> Result<Arc<S>> {
        let values = self.desc.resolve_pairs(pairs)?;
        Ok(self.get_or_create(values))
    }

    pub(crate) fn len(&self) -> usize {
        read(&self.series).len()
    }

    fn snapshot(&self) -> MetricFamily {
        let series = read(&self.series);
        let samples = series
            .iter()
            .map(|(values, s)| Sample {
                labels: LabelSet::from_values(self.desc.label_names(), values),
                value: s.sample(),
            })
            .collect();
        MetricFamily {
            desc: self.desc.clone(),
            samples,
        }
    }
}

impl<S: Series> Collector for Family<S> {
    fn descs(&self) -> Vec<Arc<Desc>> {
        vec![self.desc.clone()]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        vec![self.snapshot()]
    }
}
