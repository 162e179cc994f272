//! Background tasks that keep the demo metrics moving.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::GeneratorsConfig;
use crate::metrics::MetricsRecorder;
use crate::utils::log_throttle::LogThrottle;

/// Simulated processing time in milliseconds: uniform in `[100, 130)`.
pub fn simulated_latency_ms<R: Rng>(rng: &mut R) -> f64 {
    f64::from(100 + rng.gen_range(0u32..30))
}

/// Handles to the running generator tasks.
pub struct Generators {
    tasks: Vec<JoinHandle<()>>,
}

impl Generators {
    /// Spawns the heartbeat counter and the latency generator onto the current runtime.
    ///
    /// Returns an empty set when generators are disabled.
    pub fn spawn<M: MetricsRecorder>(metrics: M, config: &GeneratorsConfig) -> Self {
        if !config.enabled {
            info!("Background generators are disabled.");
            return Generators { tasks: Vec::new() };
        }

        let counter_every = Duration::from_millis(config.counter_interval_ms.max(1));
        let latency_every = Duration::from_millis(config.latency_interval_ms.max(1));
        info!(
            counter_interval_ms = counter_every.as_millis() as u64,
            latency_interval_ms = latency_every.as_millis() as u64,
            "Starting background generators"
        );

        let tasks = vec![
            tokio::spawn(run_counter(metrics.clone(), counter_every)),
            tokio::spawn(run_latency(metrics, latency_every, StdRng::from_entropy())),
        ];
        Generators { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stops every task and waits for them to finish.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!(error = %e, "Background generator panicked");
                }
            }
        }
        info!("Background generators stopped.");
    }
}

async fn run_counter<M: MetricsRecorder>(metrics: M, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        metrics.record_tick();
    }
}

async fn run_latency<M: MetricsRecorder>(metrics: M, every: Duration, mut rng: StdRng) {
    let throttle = LogThrottle::new(Duration::from_secs(60));
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let observed = simulated_latency_ms(&mut rng);
        if let Err(e) = metrics.record_processing_time_ms(observed) {
            if let Some(suppressed) = throttle.should_emit("processing_time") {
                warn!(error = %e, suppressed, "Dropping simulated processing time");
            }
        }
    }
}
