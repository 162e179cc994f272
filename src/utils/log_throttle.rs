//! Rate limiting for repetitive warnings, e.g. from hot metric-recording loops.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    suppressed: u64,
}

/// Tracks one window per key; at most one event per key is let through per window.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        LogThrottle {
            interval,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `Some(suppressed)` when the event for `key` should be logged, where
    /// `suppressed` counts events swallowed since the last emission; `None` otherwise.
    pub fn should_emit(&self, key: &str) -> Option<u64> {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();

        let Some(window) = windows.get_mut(key) else {
            windows.insert(
                key.to_string(),
                Window {
                    opened_at: now,
                    suppressed: 0,
                },
            );
            return Some(0);
        };

        if now.duration_since(window.opened_at) < self.interval {
            window.suppressed += 1;
            return None;
        }
        let suppressed = window.suppressed;
        window.opened_at = now;
        window.suppressed = 0;
        Some(suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::LogThrottle;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn emits_then_suppresses_then_emits_with_count() {
        let throttle = LogThrottle::new(Duration::from_millis(20));

        assert_eq!(throttle.should_emit("latency"), Some(0));
        assert_eq!(throttle.should_emit("latency"), None);
        assert_eq!(throttle.should_emit("latency"), None);
        assert_eq!(throttle.should_emit("ticker"), Some(0));

        sleep(Duration::from_millis(30));
        assert_eq!(throttle.should_emit("latency"), Some(2));
    }
}
