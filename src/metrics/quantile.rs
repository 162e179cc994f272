//! Targeted quantile estimation with bounded memory.
//!
//! Implements the biased-quantile stream of Cormode, Korn, Muthukrishnan and
//! Srivastava ("Effective Computation of Biased Quantiles over Data Streams"),
//! restricted to a fixed set of `(quantile, error)` targets. For each target the
//! reported value has a rank within `error * n` of `quantile * n`. Only a compressed
//! list of samples is kept, so memory depends on the targets rather than on how many
//! values were inserted.

/// Inserts are buffered and merged in sorted batches of this size.
const BUFFER_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tuple {
    value: f64,
    /// Rank difference to the previous tuple (`g`).
    width: f64,
    /// Maximum rank uncertainty of this tuple (`delta`).
    delta: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct TargetedStream {
    targets: Vec<(f64, f64)>,
    buffer: Vec<f64>,
    tuples: Vec<Tuple>,
    n: f64,
}

impl TargetedStream {
    /// `targets` are `(quantile, error)` pairs, already validated by the caller.
    pub(crate) fn new(targets: Vec<(f64, f64)>) -> Self {
        TargetedStream {
            targets,
            buffer: Vec::with_capacity(BUFFER_CAPACITY),
            tuples: Vec::new(),
            n: 0.0,
        }
    }

    pub(crate) fn insert(&mut self, value: f64) {
        self.buffer.push(value);
        if self.buffer.len() == BUFFER_CAPACITY {
            self.flush();
        }
    }

    pub(crate) fn reset(&mut self) {
        self.buffer.clear();
        self.tuples.clear();
        self.n = 0.0;
    }

    /// Number of tuples retained after compression.
    #[cfg(test)]
    fn retained(&self) -> usize {
        self.tuples.len()
    }

    /// Estimate for quantile `q`; `NaN` when nothing was inserted.
    ///
    /// While every value still fits in the insert buffer the answer is the exact
    /// nearest-rank quantile.
    pub(crate) fn query(&mut self, q: f64) -> f64 {
        if self.tuples.is_empty() {
            if self.buffer.is_empty() {
                return f64::NAN;
            }
            self.buffer.sort_by(f64::total_cmp);
            let rank = (q * self.buffer.len() as f64).ceil() as usize;
            return self.buffer[rank.saturating_sub(1).min(self.buffer.len() - 1)];
        }

        self.flush();
        let mut target = (q * self.n).ceil();
        target += (self.invariant(target) / 2.0).ceil();

        let mut previous = self.tuples[0];
        let mut rank = 0.0;
        for tuple in &self.tuples[1..] {
            rank += previous.width;
            if rank + tuple.width + tuple.delta > target {
                return previous.value;
            }
            previous = *tuple;
        }
        previous.value
    }

    /// Allowed rank uncertainty `f(r, n)` at rank `r`.
    fn invariant(&self, rank: f64) -> f64 {
        let mut allowed = f64::MAX;
        for (q, error) in &self.targets {
            let f = if q * self.n <= rank {
                2.0 * error * rank / q
            } else {
                2.0 * error * (self.n - rank) / (1.0 - q)
            };
            if f < allowed {
                allowed = f;
            }
        }
        allowed
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let mut batch = std::mem::take(&mut self.buffer);
        batch.sort_by(f64::total_cmp);
        self.merge(&batch);
        batch.clear();
        self.buffer = batch;
        self.compress();
    }

    fn merge(&mut self, sorted: &[f64]) {
        let mut rank = 0.0;
        let mut i = 0;
        for &value in sorted {
            while i < self.tuples.len() && self.tuples[i].value <= value {
                rank += self.tuples[i].width;
                i += 1;
            }
            let delta = if i == 0 || i == self.tuples.len() {
                0.0
            } else {
                (self.invariant(rank).floor() - 1.0).max(0.0)
            };
            self.tuples.insert(
                i,
                Tuple {
                    value,
                    width: 1.0,
                    delta,
                },
            );
            i += 1;
            self.n += 1.0;
            rank += 1.0;
        }
    }

    fn compress(&mut self) {
        if self.tuples.len() < 2 {
            return;
        }
        let mut last = self.tuples.len() - 1;
        let mut rank = self.n - 1.0 - self.tuples[last].width;

        for i in (0..last).rev() {
            let current = self.tuples[i];
            let next = self.tuples[last];
            if current.width + next.width + next.delta <= self.invariant(rank) {
                self.tuples[last].width += current.width;
                self.tuples.remove(i);
                last -= 1;
            } else {
                last = i;
            }
            rank -= current.width;
        }
    }
}
