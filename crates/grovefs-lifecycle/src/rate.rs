//! Purge throughput measurement.
//!
//! Converts a stream of "one entry reclaimed" events into a smoothed
//! entries/second figure at bounded cost: only a running count and the
//! window-start timestamp are kept. The published value is a recent
//! estimate, not a precise long-term average.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-sample rate estimator fed by the reclaim driver.
#[derive(Debug)]
pub struct RateMonitor {
    /// Minimum elapsed time before a sample is published.
    period: Duration,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    measuring: bool,
    count: u64,
    window_start: Option<Instant>,
    rate: f64,
}

impl RateMonitor {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            inner: Mutex::new(Inner {
                measuring: true,
                count: 0,
                window_start: None,
                rate: 0.0,
            }),
        }
    }

    /// Record one reclaimed unit.
    ///
    /// Returns the freshly published rate when the current window has
    /// lasted at least the sampling period, `None` otherwise.
    pub fn record(&self) -> Option<f64> {
        let mut inner = self.inner.lock();
        if !inner.measuring {
            return None;
        }

        let now = Instant::now();
        let start = *inner.window_start.get_or_insert(now);
        inner.count += 1;

        let elapsed = now.duration_since(start);
        if inner.count > 1 && elapsed >= self.period && !elapsed.is_zero() {
            let rate = inner.count as f64 / elapsed.as_secs_f64();
            inner.rate = rate;
            inner.count = 0;
            inner.window_start = None;
            tracing::debug!(rate = format_args!("{:.3}", rate), "Purge rate sample");
            Some(rate)
        } else {
            None
        }
    }

    /// The most recently published rate, in units/second. Zero until the
    /// first window completes.
    pub fn rate(&self) -> f64 {
        self.inner.lock().rate
    }

    /// Stop accumulating events (e.g. while the reclaim driver is idle).
    pub fn pause(&self) {
        self.inner.lock().measuring = false;
    }

    /// Resume accumulating events.
    pub fn resume(&self) {
        self.inner.lock().measuring = true;
    }

    /// Discard the current window and published rate.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.count = 0;
        inner.window_start = None;
        inner.rate = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_publish_within_period() {
        let monitor = RateMonitor::new(Duration::from_secs(60));
        for _ in 0..100 {
            assert!(monitor.record().is_none());
        }
        assert_eq!(monitor.rate(), 0.0);
    }

    #[test]
    fn test_publishes_after_period() {
        let monitor = RateMonitor::new(Duration::from_millis(5));

        assert!(monitor.record().is_none());
        std::thread::sleep(Duration::from_millis(10));
        let published = monitor.record().expect("window exceeded period");

        // 2 events over >= 5ms: positive, bounded by count/period.
        assert!(published > 0.0);
        assert!(published <= 2.0 / 0.005);
        assert_eq!(monitor.rate(), published);
    }

    #[test]
    fn test_window_resets_after_publish() {
        let monitor = RateMonitor::new(Duration::from_millis(1));
        monitor.record();
        std::thread::sleep(Duration::from_millis(3));
        assert!(monitor.record().is_some());

        // A fresh window starts counting from scratch.
        assert!(monitor.record().is_none());
    }

    #[test]
    fn test_pause_stops_accumulation() {
        let monitor = RateMonitor::new(Duration::from_millis(1));
        monitor.pause();
        monitor.record();
        std::thread::sleep(Duration::from_millis(3));
        assert!(monitor.record().is_none());
        assert_eq!(monitor.rate(), 0.0);

        monitor.resume();
        monitor.record();
        std::thread::sleep(Duration::from_millis(3));
        assert!(monitor.record().is_some());
    }

    #[test]
    fn test_reset_clears_rate() {
        let monitor = RateMonitor::new(Duration::from_millis(1));
        monitor.record();
        std::thread::sleep(Duration::from_millis(3));
        monitor.record();
        assert!(monitor.rate() > 0.0);

        monitor.reset();
        assert_eq!(monitor.rate(), 0.0);
    }
}
