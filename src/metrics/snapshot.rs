//! Point-in-time views of registered metrics, as handed to the encoder.

use std::sync::Arc;

use super::desc::Desc;

/// Label pairs identifying one series, in the descriptor's label order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct LabelSet(Vec<(String, String)>);

impl LabelSet {
    pub(crate) fn from_values(names: &[String], values: &[String]) -> Self {
        LabelSet(names.iter().cloned().zip(values.iter().cloned()).collect())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the label called `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Cumulative histogram state. `buckets` excludes the implicit `+Inf` bucket,
/// whose count is always `count`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub buckets: Vec<(f64, u64)>,
    pub count: u64,
    pub sum: f64,
}

/// Summary state; `quantiles` pairs each objective with its current estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySnapshot {
    pub quantiles: Vec<(f64, f64)>,
    pub count: u64,
    pub sum: f64,
}

/// Value of a single series.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Counter(f64),
    Gauge(f64),
    Histogram(HistogramSnapshot),
    Summary(SummarySnapshot),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: LabelSet,
    pub value: SeriesValue,
}

/// All series of one metric, read under the metric's own lock.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub desc: Arc<Desc>,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    /// Finds the sample whose labels equal `labels` (by name and value, any order).
    pub fn sample(&self, labels: &[(&str, &str)]) -> Option<&Sample> {
        self.samples.iter().find(|s| {
            s.labels.pairs().len() == labels.len()
                && labels.iter().all(|(n, v)| s.labels.get(n) == Some(*v))
        })
    }
}
