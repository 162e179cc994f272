//! Gauges: values that move freely in both directions.

use std::sync::Arc;

use super::desc::{Desc, MetricKind, Opts};
use super::error::Result;
use super::family::{Family, Series};
use super::snapshot::SeriesValue;
use super::sync::AtomicF64;

#[derive(Debug, Default)]
pub(crate) struct GaugeCore {
    value: AtomicF64,
}

impl Series for GaugeCore {
    fn sample(&self) -> SeriesValue {
        SeriesValue::Gauge(self.value.get())
    }
}

/// Handle to one gauge series. Cloning shares the series.
#[derive(Clone)]
pub struct Gauge {
    core: Arc<GaugeCore>,
}

impl Gauge {
    pub fn set(&self, value: f64) {
        self.core.value.set(value);
    }

    pub fn inc(&self) {
        self.add(1.0);
    }

    pub fn dec(&self) {
        self.sub(1.0);
    }

    pub fn add(&self, delta: f64) {
        self.core.value.add(delta);
    }

    pub fn sub(&self, delta: f64) {
        self.core.value.add(-delta);
    }

    pub fn get(&self) -> f64 {
        self.core.value.get()
    }
}

/// A gauge partitioned by label values.
#[derive(Clone)]
pub struct GaugeVec {
    family: Arc<Family<GaugeCore>>,
}

impl GaugeVec {
    pub fn with_label_values(&self, values: &[&str]) -> Result<Gauge> {
        let core = self.family.with_label_values(values)?;
        Ok(Gauge { core })
    }

    pub fn with(&self, labels: &[(&str, &str)]) -> Result<Gauge> {
        let core = self.family.with(labels)?;
        Ok(Gauge { core })
    }

    pub fn series_count(&self) -> usize {
        self.family.len()
    }
}

pub(crate) fn gauge_family(opts: &Opts, label_names: &[&str]) -> Result<Family<GaugeCore>> {
    let desc = Desc::new(opts, MetricKind::Gauge, label_names)?;
    Ok(Family::new(desc, GaugeCore::default))
}

pub(crate) fn gauge(family: Arc<Family<GaugeCore>>) -> Gauge {
    Gauge {
        core: family.get_or_create(Vec::new()),
    }
}

pub(crate) fn gauge_vec(family: Arc<Family<GaugeCore>>) -> GaugeVec {
    GaugeVec { family }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_in_both_directions() {
        let family = gauge_family(&Opts::new("in_flight", ""), &[]).unwrap();
        let g = gauge(Arc::new(family));

        g.inc();
        g.inc();
        g.dec();
        assert_eq!(g.get(), 1.0);

        g.sub(4.5);
        assert_eq!(g.get(), -3.5);

        g.set(42.0);
        g.add(0.5);
        assert_eq!(g.get(), 42.5);
    }

    #[test]
    fn vec_rejects_wrong_arity() {
        let family = gauge_family(&Opts::new("queue_depth", ""), &["queue"]).unwrap();
        let vec = gauge_vec(Arc::new(family));
        assert!(vec.with_label_values(&["a", "b"]).is_err());
        assert!(vec.with_label_values(&[]).is_err());
        assert_eq!(vec.series_count(), 0);
    }
}
