//! Histograms with fixed cumulative buckets.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::desc::{Desc, MetricKind, Opts};
use super::error::{MetricsError, Result};
use super::family::{Family, Series};
use super::snapshot::{HistogramSnapshot, SeriesValue};
use super::sync::lock;

/// Buckets used when none are configured, tuned for request latencies in seconds.
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// `count` buckets starting at `start`, each `width` apart.
pub fn linear_buckets(start: f64, width: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + width * i as f64).collect()
}

/// `count` buckets starting at `start`, each `factor` times the previous one.
pub fn exponential_buckets(start: f64, factor: f64, count: usize) -> Vec<f64> {
    std::iter::successors(Some(start), |b| Some(b * factor))
        .take(count)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramOpts {
    pub common: Opts,
    pub buckets: Vec<f64>,
}

impl HistogramOpts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        HistogramOpts {
            common: Opts::new(name, help),
            buckets: DEFAULT_BUCKETS.to_vec(),
        }
    }

    pub fn buckets(mut self, buckets: Vec<f64>) -> Self {
        self.buckets = buckets;
        self
    }
}

/// Validates caller-supplied bounds. A trailing `+Inf` is implicit and dropped.
fn check_buckets(name: &str, buckets: &[f64]) -> Result<Arc<[f64]>> {
    let mut bounds = buckets.to_vec();
    if bounds.last() == Some(&f64::INFINITY) {
        bounds.pop();
    }
    if bounds.is_empty() {
        return Err(MetricsError::InvalidBuckets {
            name: name.to_string(),
            reason: "at least one finite upper bound is required".to_string(),
        });
    }
    if bounds.iter().any(|b| b.is_nan()) {
        return Err(MetricsError::InvalidBuckets {
            name: name.to_string(),
            reason: "bucket bounds must not be NaN".to_string(),
        });
    }
    if let Some(pair) = bounds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(MetricsError::InvalidBuckets {
            name: name.to_string(),
            reason: format!(
                "bounds must be strictly increasing, found {} followed by {}",
                pair[0], pair[1]
            ),
        });
    }
    Ok(bounds.into())
}

#[derive(Debug)]
struct HistogramState {
    cumulative: Vec<u64>,
    count: u64,
    sum: f64,
}

#[derive(Debug)]
pub(crate) struct HistogramCore {
    upper_bounds: Arc<[f64]>,
    state: Mutex<HistogramState>,
}

impl HistogramCore {
    fn new(upper_bounds: Arc<[f64]>) -> Self {
        let state = HistogramState {
            cumulative: vec![0; upper_bounds.len()],
            count: 0,
            sum: 0.0,
        };
        HistogramCore {
            upper_bounds,
            state: Mutex::new(state),
        }
    }

    fn observe(&self, value: f64) {
        let mut state = lock(&self.state);
        for (bucket, bound) in state.cumulative.iter_mut().zip(self.upper_bounds.iter()) {
            if value <= *bound {
                *bucket += 1;
            }
        }
        state.count += 1;
        state.sum += value;
    }

    fn snapshot(&self) -> HistogramSnapshot {
        let state = lock(&self.state);
        HistogramSnapshot {
            buckets: self
                .upper_bounds
                .iter()
                .copied()
                .zip(state.cumulative.iter().copied())
                .collect(),
            count: state.count,
            sum: state.sum,
        }
    }
}

impl Series for HistogramCore {
    fn sample(&self) -> SeriesValue {
        SeriesValue::Histogram(self.snapshot())
    }
}

/// Handle to one histogram series. Cloning shares the series.
#[derive(Clone)]
pub struct Histogram {
    desc: Arc<Desc>,
    core: Arc<HistogramCore>,
}

impl Histogram {
    /// Records `value` in every bucket whose upper bound is at least `value`.
    pub fn observe(&self, value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(MetricsError::InvalidValue {
                name: self.desc.name().to_string(),
                value,
            });
        }
        self.core.observe(value);
        Ok(())
    }

    /// Starts a timer that observes elapsed seconds when stopped or dropped.
    pub fn start_timer(&self) -> HistogramTimer {
        HistogramTimer {
            histogram: self.clone(),
            start: Instant::now(),
            observed: false,
        }
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        self.core.snapshot()
    }
}

/// Measures a duration into a [`Histogram`].
#[must_use = "a timer observes its histogram when dropped"]
pub struct HistogramTimer {
    histogram: Histogram,
    start: Instant,
    observed: bool,
}

impl HistogramTimer {
    /// Observes the elapsed time in seconds and returns it.
    pub fn observe_duration(mut self) -> f64 {
        self.record()
    }

    /// Stops the timer without recording anything.
    pub fn stop_and_discard(mut self) {
        self.observed = true;
    }

    fn record(&mut self) -> f64 {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.observed = true;
        let _ = self.histogram.observe(elapsed);
        elapsed
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        if !self.observed {
            self.record();
        }
    }
}

/// A histogram partitioned by label values; all series share the same bounds.
#[derive(Clone)]
pub struct HistogramVec {
    family: Arc<Family<HistogramCore>>,
}

impl HistogramVec {
    pub fn with_label_values(&self, values: &[&str]) -> Result<Histogram> {
        let core = self.family.with_label_values(values)?;
        Ok(self.handle(core))
    }

    pub fn with(&self, labels: &[(&str, &str)]) -> Result<Histogram> {
        let core = self.family.with(labels)?;
        Ok(self.handle(core))
    }

    pub fn series_count(&self) -> usize {
        self.family.len()
    }

    fn handle(&self, core: Arc<HistogramCore>) -> Histogram {
        Histogram {
            desc: self.family.desc().clone(),
            core,
        }
    }
}

pub(crate) fn histogram_family(
    opts: &HistogramOpts,
    label_names: &[&str],
) -> Result<Family<HistogramCore>> {
    let desc = Desc::new(&opts.common, MetricKind::Histogram, label_names)?;
    let bounds = check_buckets(desc.name(), &opts.buckets)?;
    Ok(Family::new(desc, move || HistogramCore::new(bounds.clone())))
}

pub(crate) fn histogram(family: Arc<Family<HistogramCore>>) -> Histogram {
    let core = family.get_or_create(Vec::new());
    Histogram {
        desc: family.desc().clone(),
        core,
    }
}

pub(crate) fn histogram_vec(family: Arc<Family<HistogramCore>>) -> HistogramVec {
    HistogramVec { family }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(buckets: Vec<f64>) -> Histogram {
        let opts = HistogramOpts::new("latency", "test histogram").buckets(buckets);
        histogram(Arc::new(histogram_family(&opts, &[]).unwrap()))
    }

    #[test]
    fn buckets_are_cumulative() {
        let h = make(vec![0.0, 10.0, 20.0]);
        for v in [5.0, 15.0, 25.0] {
            h.observe(v).unwrap();
        }

        let snap = h.snapshot();
        assert_eq!(snap.buckets, vec![(0.0, 0), (10.0, 1), (20.0, 2)]);
        assert_eq!(snap.count, 3);
        assert_eq!(snap.sum, 45.0);
    }

    #[test]
    fn bound_is_inclusive() {
        let h = make(vec![1.0, 2.0]);
        h.observe(1.0).unwrap();
        assert_eq!(h.snapshot().buckets, vec![(1.0, 1), (2.0, 1)]);
    }

    #[test]
    fn nan_is_rejected_and_state_unchanged() {
        let h = make(vec![1.0]);
        h.observe(0.5).unwrap();
        assert!(matches!(
            h.observe(f64::NAN),
            Err(MetricsError::InvalidValue { .. })
        ));
        let snap = h.snapshot();
        assert_eq!(snap.count, 1);
        assert_eq!(snap.sum, 0.5);
    }

    #[test]
    fn bucket_validation() {
        assert!(check_buckets("h", &[1.0, 1.0]).is_err());
        assert!(check_buckets("h", &[2.0, 1.0]).is_err());
        assert!(check_buckets("h", &[]).is_err());
        assert!(check_buckets("h", &[f64::INFINITY]).is_err());
        assert!(check_buckets("h", &[1.0, f64::NAN]).is_err());
        assert_eq!(
            &*check_buckets("h", &[1.0, 2.0, f64::INFINITY]).unwrap(),
            &[1.0, 2.0]
        );
    }

    #[test]
    fn bucket_helpers() {
        assert_eq!(linear_buckets(0.0, 10.0, 4), vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(exponential_buckets(1.0, 2.0, 4), vec![1.0, 2.0, 4.0, 8.0]);
        assert_eq!(linear_buckets(0.0, 10.0, 20).last(), Some(&190.0));
    }

    #[test]
    fn timer_observes_once() {
        let h = make(DEFAULT_BUCKETS.to_vec());

        let elapsed = h.start_timer().observe_duration();
        assert!(elapsed >= 0.0);

        {
            let _timer = h.start_timer();
        }
        h.start_timer().stop_and_discard();

        assert_eq!(h.snapshot().count, 2);
    }
}
