//! Configuration for the lifecycle subsystem.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a progress reporter instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Interval between re-scans of durable job state while jobs exist.
    #[serde(with = "secs_compat", default = "default_tick_interval")]
    pub tick_interval: Duration,

    /// Interval between re-checks for new jobs while draining.
    #[serde(with = "secs_compat", default = "default_drain_recheck_interval")]
    pub drain_recheck_interval: Duration,

    /// How long to keep indicators alive after the last job disappears.
    /// Back-to-back jobs within this window reuse the indicators without
    /// flicker.
    #[serde(with = "secs_compat", default = "default_drain_grace_period")]
    pub drain_grace_period: Duration,

    /// Minimum measurement window for the purge rate monitor.
    #[serde(with = "secs_compat", default = "default_rate_sample_period")]
    pub rate_sample_period: Duration,
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_drain_recheck_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_drain_grace_period() -> Duration {
    Duration::from_secs(30)
}

fn default_rate_sample_period() -> Duration {
    Duration::from_millis(1)
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            drain_recheck_interval: default_drain_recheck_interval(),
            drain_grace_period: default_drain_grace_period(),
            rate_sample_period: default_rate_sample_period(),
        }
    }
}

/// Worker-pool concurrency limits, shared with the reporters.
///
/// The pools themselves live outside this subsystem; their limits are
/// operator-tunable at runtime, so reporters read them once per tick rather
/// than capturing them at construction.
#[derive(Debug)]
pub struct ConcurrencyLimits {
    max_concurrent_clones: AtomicUsize,
    max_concurrent_purges: AtomicUsize,
}

impl ConcurrencyLimits {
    pub fn new(max_concurrent_clones: usize, max_concurrent_purges: usize) -> Self {
        Self {
            max_concurrent_clones: AtomicUsize::new(max_concurrent_clones),
            max_concurrent_purges: AtomicUsize::new(max_concurrent_purges),
        }
    }

    pub fn max_concurrent_clones(&self) -> usize {
        self.max_concurrent_clones.load(Ordering::Relaxed)
    }

    pub fn max_concurrent_purges(&self) -> usize {
        self.max_concurrent_purges.load(Ordering::Relaxed)
    }

    pub fn set_max_concurrent_clones(&self, n: usize) {
        self.max_concurrent_clones.store(n, Ordering::Relaxed);
    }

    pub fn set_max_concurrent_purges(&self, n: usize) {
        self.max_concurrent_purges.store(n, Ordering::Relaxed);
    }
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

mod secs_compat {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReporterConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.drain_recheck_interval, Duration::from_secs(1));
        assert_eq!(config.drain_grace_period, Duration::from_secs(30));
        assert_eq!(config.rate_sample_period, Duration::from_millis(1));
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config: ReporterConfig = toml::from_str(
            r#"
            tick_interval = 2.0
            drain_recheck_interval = 0.5
            drain_grace_period = 10.0
            rate_sample_period = 0.001
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_interval, Duration::from_secs(2));
        assert_eq!(config.drain_recheck_interval, Duration::from_millis(500));
        assert_eq!(config.drain_grace_period, Duration::from_secs(10));
        assert_eq!(config.rate_sample_period, Duration::from_millis(1));
    }

    #[test]
    fn test_config_defaults_from_empty() {
        let config: ReporterConfig = toml::from_str("").unwrap();
        assert_eq!(config.drain_grace_period, Duration::from_secs(30));
    }

    #[test]
    fn test_concurrency_limits_tunable() {
        let limits = ConcurrencyLimits::default();
        assert_eq!(limits.max_concurrent_clones(), 4);
        assert_eq!(limits.max_concurrent_purges(), 4);

        limits.set_max_concurrent_clones(8);
        assert_eq!(limits.max_concurrent_clones(), 8);
    }
}
