//! Summaries: client-side quantiles over a sliding time window.
//!
//! Every observation is inserted into `age_buckets` quantile streams. The streams are
//! staggered: each one is reset in turn every `max_age / age_buckets`, and quantiles
//! are read from the stream that has gone longest without a reset. A reported quantile
//! therefore covers at most `max_age` worth of observations, while `count` and `sum`
//! keep growing for the life of the process. Each stream keeps a compressed sample
//! list sized by the objectives' error terms, not by the observation rate.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::desc::{Desc, MetricKind, Opts};
use super::error::{MetricsError, Result};
use super::family::{Family, Series};
use super::quantile::TargetedStream;
use super::snapshot::{SeriesValue, SummarySnapshot};
use super::sync::lock;

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_AGE_BUCKETS: u32 = 5;

/// Quantile objectives with their tolerated rank error.
pub const DEFAULT_OBJECTIVES: &[(f64, f64)] = &[(0.5, 0.05), (0.9, 0.01), (0.99, 0.001)];

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOpts {
    pub common: Opts,
    /// `(quantile, allowed rank error)` pairs.
    pub objectives: Vec<(f64, f64)>,
    pub max_age: Duration,
    pub age_buckets: u32,
}

impl SummaryOpts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        SummaryOpts {
            common: Opts::new(name, help),
            objectives: DEFAULT_OBJECTIVES.to_vec(),
            max_age: DEFAULT_MAX_AGE,
            age_buckets: DEFAULT_AGE_BUCKETS,
        }
    }

    pub fn objectives(mut self, objectives: Vec<(f64, f64)>) -> Self {
        self.objectives = objectives;
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn age_buckets(mut self, age_buckets: u32) -> Self {
        self.age_buckets = age_buckets;
        self
    }
}

/// Validates objectives and returns them sorted by quantile, one entry per quantile.
fn check_objectives(name: &str, objectives: &[(f64, f64)]) -> Result<Arc<[(f64, f64)]>> {
    let mut checked: Vec<(f64, f64)> = Vec::with_capacity(objectives.len());
    for &(q, error) in objectives {
        if !(0.0..=1.0).contains(&q) {
            return Err(MetricsError::InvalidDescriptor(format!(
                "quantile {} of summary '{}' is outside [0, 1]",
                q, name
            )));
        }
        if !(0.0..1.0).contains(&error) {
            return Err(MetricsError::InvalidDescriptor(format!(
                "error {} for quantile {} of summary '{}' is outside [0, 1)",
                error, q, name
            )));
        }
        checked.push((q, error));
    }
    checked.sort_by(|a, b| a.0.total_cmp(&b.0));
    checked.dedup_by(|a, b| a.0 == b.0);
    Ok(checked.into())
}

#[derive(Debug)]
struct SummaryState {
    streams: Vec<TargetedStream>,
    head: usize,
    head_expires: Instant,
    count: u64,
    sum: f64,
}

#[derive(Debug)]
pub(crate) struct SummaryCore {
    objectives: Arc<[(f64, f64)]>,
    max_age: Duration,
    rotate_every: Duration,
    state: Mutex<SummaryState>,
}

impl SummaryCore {
    /// `rotate_every` (`max_age / age_buckets`) must be non-zero.
    fn new(objectives: Arc<[(f64, f64)]>, max_age: Duration, age_buckets: u32) -> Self {
        let rotate_every = max_age / age_buckets;
        let stream = TargetedStream::new(objectives.to_vec());
        let state = SummaryState {
            streams: vec![stream; age_buckets as usize],
            head: 0,
            head_expires: Instant::now() + rotate_every,
            count: 0,
            sum: 0.0,
        };
        SummaryCore {
            objectives,
            max_age,
            rotate_every,
            state: Mutex::new(state),
        }
    }

    fn rotate(&self, state: &mut SummaryState, now: Instant) {
        if now >= state.head_expires + self.max_age {
            // Idle for a whole window cycle; nothing retained is still in range.
            state.streams.iter_mut().for_each(TargetedStream::reset);
            state.head = 0;
            state.head_expires = now + self.rotate_every;
            return;
        }
        while now >= state.head_expires {
            let head = state.head;
            state.streams[head].reset();
            state.head = (head + 1) % state.streams.len();
            state.head_expires += self.rotate_every;
        }
    }

    fn observe(&self, value: f64) {
        let mut state = lock(&self.state);
        self.rotate(&mut state, Instant::now());
        for stream in state.streams.iter_mut() {
            stream.insert(value);
        }
        state.count += 1;
        state.sum += value;
    }

    fn snapshot(&self) -> SummarySnapshot {
        let mut state = lock(&self.state);
        self.rotate(&mut state, Instant::now());

        let head = state.head;
        let quantiles = self
            .objectives
            .iter()
            .map(|(q, _)| (*q, state.streams[head].query(*q)))
            .collect();

        SummarySnapshot {
            quantiles,
            count: state.count,
            sum: state.sum,
        }
    }
}

impl Series for SummaryCore {
    fn sample(&self) -> SeriesValue {
        SeriesValue::Summary(self.snapshot())
    }
}

/// Handle to one summary series. Cloning shares the series.
#[derive(Clone)]
pub struct Summary {
    desc: Arc<Desc>,
    core: Arc<SummaryCore>,
}

impl Summary {
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

    pub fn snapshot(&self) -> SummarySnapshot {
        self.core.snapshot()
    }
}

/// A summary partitioned by label values.
#[derive(Clone)]
pub struct SummaryVec {
    family: Arc<Family<SummaryCore>>,
}

impl SummaryVec {
    pub fn with_label_values(&self, values: &[&str]) -> Result<Summary> {
        let core = self.family.with_label_values(values)?;
        Ok(self.handle(core))
    }

    pub fn with(&self, labels: &[(&str, &str)]) -> Result<Summary> {
        let core = self.family.with(labels)?;
        Ok(self.handle(core))
    }

    pub fn series_count(&self) -> usize {
        self.family.len()
    }

    fn handle(&self, core: Arc<SummaryCore>) -> Summary {
        Summary {
            desc: self.family.desc().clone(),
            core,
        }
    }
}

pub(crate) fn summary_family(
    opts: &SummaryOpts,
    label_names: &[&str],
) -> Result<Family<SummaryCore>> {
    let desc = Desc::new(&opts.common, MetricKind::Summary, label_names)?;
    let objectives = check_objectives(desc.name(), &opts.objectives)?;
    if opts.age_buckets == 0 || (opts.max_age / opts.age_buckets).is_zero() {
        return Err(MetricsError::InvalidDescriptor(format!(
            "summary '{}' needs a max_age of at least one nanosecond per age bucket",
            desc.name()
        )));
    }
    let (max_age, age_buckets) = (opts.max_age, opts.age_buckets);
    Ok(Family::new(desc, move || {
        SummaryCore::new(objectives.clone(), max_age, age_buckets)
    }))
}

pub(crate) fn summary(family: Arc<Family<SummaryCore>>) -> Summary {
    let core = family.get_or_create(Vec::new());
    Summary {
        desc: family.desc().clone(),
        core,
    }
}

pub(crate) fn summary_vec(family: Arc<Family<SummaryCore>>) -> SummaryVec {
    SummaryVec { family }
}
