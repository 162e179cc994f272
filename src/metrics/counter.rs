//! Monotonic counters.

use std::sync::Arc;

use super::desc::{Desc, MetricKind, Opts};
use super::error::{MetricsError, Result};
use super::family::{Family, Series};
use super::snapshot::SeriesValue;
use super::sync::AtomicF64;

#[derive(Debug, Default)]
pub(crate) struct CounterCore {
    value: AtomicF64,
}

impl Series for CounterCore {
    fn sample(&self) -> SeriesValue {
        SeriesValue::Counter(self.value.get())
    }
}

/// Handle to one counter series. Cloning shares the series.
#[derive(Clone)]
pub struct Counter {
    desc: Arc<Desc>,
    core: Arc<CounterCore>,
}

impl Counter {
    pub fn inc(&self) {
        self.core.value.add(1.0);
    }

    /// Adds `delta`, which must be non-negative.
    pub fn inc_by(&self, delta: f64) -> Result<()> {
        // Written so that NaN fails too.
        if !(delta >= 0.0) {
            return Err(MetricsError::InvalidDelta {
                name: self.desc.name().to_string(),
                delta,
            });
        }
        self.core.value.add(delta);
        Ok(())
    }

    pub fn get(&self) -> f64 {
        self.core.value.get()
    }
}

/// A counter partitioned by label values.
#[derive(Clone)]
pub struct CounterVec {
    family: Arc<Family<CounterCore>>,
}

impl CounterVec {
    pub fn with_label_values(&self, values: &[&str]) -> Result<Counter> {
        let core = self.family.with_label_values(values)?;
        Ok(self.handle(core))
    }

    pub fn with(&self, labels: &[(&str, &str)]) -> Result<Counter> {
        let core = self.family.with(labels)?;
        Ok(self.handle(core))
    }

    /// Number of label sets seen so far.
    pub fn series_count(&self) -> usize {
        self.family.len()
    }

    fn handle(&self, core: Arc<CounterCore>) -> Counter {
        Counter {
            desc: self.family.desc().clone(),
            core,
        }
    }
}

pub(crate) fn counter_family(opts: &Opts, label_names: &[&str]) -> Result<Family<CounterCore>> {
    let desc = Desc::new(opts, MetricKind::Counter, label_names)?;
    Ok(Family::new(desc, CounterCore::default))
}

pub(crate) fn counter(family: Arc<Family<CounterCore>>) -> Counter {
    let core = family.get_or_create(Vec::new());
    Counter {
        desc: family.desc().clone(),
        core,
    }
}

pub(crate) fn counter_vec(family: Arc<Family<CounterCore>>) -> CounterVec {
    CounterVec { family }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn unlabeled(name: &str) -> Counter {
        let family = counter_family(&Opts::new(name, "test counter"), &[]).unwrap();
        counter(Arc::new(family))
    }

    #[test]
    fn value_is_sum_of_deltas() {
        let c = unlabeled("deltas_total");
        for delta in [0.0, 1.5, 2.0, 0.25] {
            c.inc_by(delta).unwrap();
        }
        c.inc();
        assert_eq!(c.get(), 4.75);
    }

    #[test]
    fn negative_and_nan_deltas_are_rejected_without_side_effects() {
        let c = unlabeled("rejects_total");
        c.inc_by(3.0).unwrap();

        let err = c.inc_by(-1.0).unwrap_err();
        assert_eq!(
            err,
            MetricsError::InvalidDelta {
                name: "rejects_total".to_string(),
                delta: -1.0
            }
        );
        assert!(c.inc_by(f64::NAN).is_err());
        assert_eq!(c.get(), 3.0);
    }

    #[test]
    fn label_sets_are_independent() {
        let family = counter_family(&Opts::new("codes_total", ""), &["code"]).unwrap();
        let vec = counter_vec(Arc::new(family));

        vec.with_label_values(&["200"]).unwrap().inc_by(5.0).unwrap();
        vec.with_label_values(&["500"]).unwrap().inc();

        assert_eq!(vec.with_label_values(&["200"]).unwrap().get(), 5.0);
        assert_eq!(vec.with(&[("code", "500")]).unwrap().get(), 1.0);
        assert_eq!(vec.series_count(), 2);
    }

    #[test]
    fn racing_creators_share_one_series() {
        let family = counter_family(&Opts::new("race_total", ""), &["worker"]).unwrap();
        let vec = counter_vec(Arc::new(family));

        thread::scope(|s| {
            for _ in 0..8 {
                let vec = vec.clone();
                s.spawn(move || {
                    for _ in 0..500 {
                        vec.with_label_values(&["shared"]).unwrap().inc();
                    }
                });
            }
        });

        assert_eq!(vec.series_count(), 1);
        assert_eq!(vec.with_label_values(&["shared"]).unwrap().get(), 4000.0);
    }
}
