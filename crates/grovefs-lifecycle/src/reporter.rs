//! Generic progress reporting for classes of long-running async jobs.
//!
//! A reporter owns a periodic timer and up to two published indicators: one
//! averaging the jobs currently executing (bounded by the worker pool's
//! concurrency limit) and one averaging all jobs including those still
//! queued, shown only while the queue is deeper than the pool.
//!
//! Rather than receiving push updates from the workers, the reporter
//! re-derives the state of every job from durable on-disk state each tick.
//! Workers can crash, be cancelled, or race with metadata cleanup;
//! recomputing from scratch is self-healing and needs no coordination
//! protocol between workers and the reporter. A [`ProgressSource`] supplies
//! only "how to enumerate jobs" and "how to compute one job's ratio".

use std::sync::Arc;

use async_trait::async_trait;
use grovefs_client::ProgressChannel;
use grovefs_types::Result;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::ReporterConfig;

/// One tick's re-derived view of a job class.
#[derive(Debug, Clone, Default)]
pub struct TickSample {
    /// Per-job completion ratios in scheduling order, each in `[0.0, 1.0]`.
    /// Empty means no jobs remain.
    pub ratios: Vec<f64>,
    /// Worker-pool concurrency limit at sampling time; jobs beyond the first
    /// `limit` are queued, not executing.
    pub limit: usize,
}

/// Supplies job enumeration and per-job ratios for one job class.
#[async_trait]
pub trait ProgressSource: Send + Sync {
    /// Short operation name used in indicator ids and default messages.
    fn op_name(&self) -> &'static str;

    /// Called once per reporting session, on the Stopped -> Active
    /// transition. A session that re-enters Active from Draining does not
    /// run this again.
    async fn on_start(&self) -> Result<()> {
        Ok(())
    }

    /// Re-derive the state of all jobs from durable storage.
    async fn sample(&self) -> Result<TickSample>;

    /// Message for the indicator covering executing jobs.
    fn active_message(&self, jobs: usize, percent: f64) -> String {
        format!(
            "{} ongoing {} jobs - average progress is {:.2}%",
            jobs,
            self.op_name(),
            percent
        )
    }

    /// Message for the indicator covering executing and queued jobs.
    fn queued_message(&self, jobs: usize, percent: f64) -> String {
        format!(
            "Total {} {} jobs - average progress is {:.2}%",
            jobs,
            self.op_name(),
            percent
        )
    }

    /// Message shown on live indicators while draining.
    fn waiting_message(&self) -> String {
        format!(
            "No pending {} jobs, waiting briefly for new ones",
            self.op_name()
        )
    }
}

/// A published indicator slot. Tracks whether it is currently shown and the
/// last fraction, so draining can hold the value instead of flapping to zero.
struct IndicatorSlot {
    id: String,
    shown: bool,
    last_fraction: f64,
}

impl IndicatorSlot {
    fn new(op_name: &str, kind: &str) -> Self {
        Self {
            id: format!("{}-{}-{}", op_name, kind, Uuid::new_v4()),
            shown: false,
            last_fraction: 0.0,
        }
    }

    async fn publish(&mut self, channel: &dyn ProgressChannel, message: &str, fraction: f64) {
        self.shown = true;
        self.last_fraction = fraction;
        channel.update(&self.id, message, fraction).await;
    }

    /// Re-publish the last fraction with a new message, if shown.
    async fn hold(&mut self, channel: &dyn ProgressChannel, message: &str) {
        if self.shown {
            channel.update(&self.id, message, self.last_fraction).await;
        }
    }

    async fn retire(&mut self, channel: &dyn ProgressChannel) {
        if self.shown {
            channel.complete(&self.id).await;
            self.shown = false;
        }
    }
}

#[derive(Default)]
struct Inner {
    running: bool,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

/// Periodic re-scan/publish driver for one [`ProgressSource`].
///
/// An explicit object owned by whatever hosts the job-submission API; there
/// is no process-wide reporter.
pub struct ProgressReporter {
    source: Arc<dyn ProgressSource>,
    channel: Arc<dyn ProgressChannel>,
    config: ReporterConfig,
    inner: Mutex<Inner>,
}

impl ProgressReporter {
    pub fn new(
        source: Arc<dyn ProgressSource>,
        channel: Arc<dyn ProgressChannel>,
        config: ReporterConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            channel,
            config,
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Start the reporting session if one is not already running.
    ///
    /// Idempotent; callers invoke this on every job submission without
    /// worrying about duplicate timers.
    pub fn initiate_reporting(self: &Arc<Self>) {
        let mut inner = self.inner.lock();
        if inner.running {
            tracing::debug!(
                op = self.source.op_name(),
                "Progress reporting already active"
            );
            return;
        }
        inner.running = true;

        let (tx, rx) = watch::channel(false);
        inner.shutdown = Some(tx);

        let this = Arc::clone(self);
        inner.task = Some(tokio::spawn(async move { this.run(rx).await }));
        tracing::info!(op = self.source.op_name(), "Progress reporting started");
    }

    /// Whether a reporting session is currently running.
    pub fn is_active(&self) -> bool {
        self.inner.lock().running
    }

    /// Stop the reporting session, if any, and wait for it to wind down.
    pub async fn shutdown(&self) {
        let (tx, task) = {
            let mut inner = self.inner.lock();
            inner.running = false;
            (inner.shutdown.take(), inner.task.take())
        };
        if let Some(tx) = tx {
            let _ = tx.send(true);
        }
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Mark this session finished so a later submission can start a new one.
    fn finish_session(&self) {
        let mut inner = self.inner.lock();
        inner.running = false;
        inner.shutdown = None;
        inner.task = None;
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let op = self.source.op_name();

        if let Err(status) = self.source.on_start().await {
            tracing::warn!(op, error = %status, "Progress source failed to initialize");
        }

        let mut active = IndicatorSlot::new(op, "ongoing");
        let mut queued = IndicatorSlot::new(op, "total");
        let mut draining_since: Option<Instant> = None;
        let mut delay = self.config.tick_interval;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }

            let sample = match self.source.sample().await {
                Ok(sample) => sample,
                Err(status) => {
                    // One bad tick never terminates the loop, and the last
                    // published fractions stay frozen until sampling
                    // recovers. State transitions only happen on successful
                    // samples.
                    tracing::warn!(op, error = %status, "Progress sampling failed this tick");
                    delay = self.config.tick_interval;
                    continue;
                }
            };

            if sample.ratios.is_empty() {
                match draining_since {
                    None => {
                        tracing::debug!(op, "No jobs left, draining");
                        draining_since = Some(Instant::now());
                    }
                    Some(since) if since.elapsed() >= self.config.drain_grace_period => {
                        self.finish_session();
                        break;
                    }
                    Some(_) => {}
                }
                let message = self.source.waiting_message();
                active.hold(self.channel.as_ref(), &message).await;
                queued.hold(self.channel.as_ref(), &message).await;
                delay = self.config.drain_recheck_interval;
                continue;
            }

            if draining_since.take().is_some() {
                tracing::debug!(op, "Jobs reappeared while draining, resuming");
            }
            self.publish(&sample, &mut active, &mut queued).await;
            delay = self.config.tick_interval;
        }

        active.retire(self.channel.as_ref()).await;
        queued.retire(self.channel.as_ref()).await;
        tracing::info!(op, "Progress reporting stopped");
    }

    async fn publish(
        &self,
        sample: &TickSample,
        active: &mut IndicatorSlot,
        queued: &mut IndicatorSlot,
    ) {
        let total = sample.ratios.len();
        let limit = sample.limit.max(1);
        let executing = total.min(limit);

        let executing_mean = mean(&sample.ratios[..executing]);
        let message = self.source.active_message(executing, executing_mean * 100.0);
        active
            .publish(self.channel.as_ref(), &message, executing_mean)
            .await;

        // Once shown, the queued indicator keeps updating until the session
        // ends, so a queue oscillating around the limit does not flicker.
        if total > limit || queued.shown {
            let total_mean = mean(&sample.ratios);
            let message = self.source.queued_message(total, total_mean * 100.0);
            queued
                .publish(self.channel.as_ref(), &message, total_mean)
                .await;
        }
    }
}

fn mean(ratios: &[f64]) -> f64 {
    if ratios.is_empty() {
        return 0.0;
    }
    ratios.iter().sum::<f64>() / ratios.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use grovefs_client::RecordingProgressChannel;
    use grovefs_types::{make_error, StatusCode};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Source whose job list and failure mode are controlled by the test.
    struct ScriptedSource {
        ratios: Mutex<Vec<f64>>,
        limit: usize,
        failing: AtomicBool,
        on_start_calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(ratios: Vec<f64>, limit: usize) -> Arc<Self> {
            Arc::new(Self {
                ratios: Mutex::new(ratios),
                limit,
                failing: AtomicBool::new(false),
                on_start_calls: AtomicUsize::new(0),
            })
        }

        fn set_ratios(&self, ratios: Vec<f64>) {
            *self.ratios.lock() = ratios;
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ProgressSource for ScriptedSource {
        fn op_name(&self) -> &'static str {
            "clone"
        }

        async fn on_start(&self) -> Result<()> {
            self.on_start_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn sample(&self) -> Result<TickSample> {
            if self.failing.load(Ordering::SeqCst) {
                return make_error(StatusCode::IO_ERROR);
            }
            Ok(TickSample {
                ratios: self.ratios.lock().clone(),
                limit: self.limit,
            })
        }
    }

    fn fast_config() -> ReporterConfig {
        ReporterConfig {
            tick_interval: Duration::from_secs(1),
            drain_recheck_interval: Duration::from_secs(1),
            drain_grace_period: Duration::from_secs(5),
            ..ReporterConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initiate_reporting_is_idempotent() {
        let source = ScriptedSource::new(vec![0.5], 4);
        let channel = Arc::new(RecordingProgressChannel::new());
        let reporter = ProgressReporter::new(source.clone(), channel.clone(), fast_config());

        reporter.initiate_reporting();
        reporter.initiate_reporting();
        reporter.initiate_reporting();

        tokio::time::sleep(Duration::from_millis(3500)).await;

        // One timer: one publish per elapsed tick, one on_start.
        assert_eq!(source.on_start_calls.load(Ordering::SeqCst), 1);
        assert_eq!(channel.updates().len(), 3);
        assert_eq!(channel.indicator_ids().len(), 1);
        assert!(reporter.is_active());

        reporter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_jobs_from_start_publishes_nothing() {
        let source = ScriptedSource::new(vec![], 4);
        let channel = Arc::new(RecordingProgressChannel::new());
        let reporter = ProgressReporter::new(source, channel.clone(), fast_config());

        reporter.initiate_reporting();
        tokio::time::sleep(Duration::from_secs(10)).await;

        // Grace elapsed with nothing ever shown: no updates, no completes.
        assert!(channel.updates().is_empty());
        assert!(channel.completed().is_empty());
        assert!(!reporter.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_active_draining_stopped() {
        let source = ScriptedSource::new(vec![0.4], 4);
        let channel = Arc::new(RecordingProgressChannel::new());
        let reporter = ProgressReporter::new(source.clone(), channel.clone(), fast_config());

        reporter.initiate_reporting();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(reporter.is_active());
        let published = channel.updates().len();
        assert!(published >= 1);

        // The job disappears; the indicator is held at its last fraction
        // while draining, then removed after the grace window.
        source.set_ratios(vec![]);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(reporter.is_active());
        let held = channel.updates().last().unwrap().clone();
        assert_eq!(held.fraction, 0.4);
        assert!(held.message.contains("waiting"));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!reporter.is_active());
        assert_eq!(channel.completed().len(), 1);

        // Nothing further is published after the stop.
        let total = channel.updates().len();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(channel.updates().len(), total);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_appearing_while_draining_resumes_without_flicker() {
        let source = ScriptedSource::new(vec![0.2], 4);
        let channel = Arc::new(RecordingProgressChannel::new());
        let reporter = ProgressReporter::new(source.clone(), channel.clone(), fast_config());

        reporter.initiate_reporting();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        source.set_ratios(vec![]);
        tokio::time::sleep(Duration::from_millis(2000)).await;

        // Back-to-back job arrives inside the grace window.
        source.set_ratios(vec![0.6]);
        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert!(reporter.is_active());
        // The indicator was never removed and kept its identity.
        assert!(channel.completed().is_empty());
        assert_eq!(channel.indicator_ids().len(), 1);
        assert_eq!(channel.live()[0].fraction, 0.6);

        reporter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_executing_and_queued_partition() {
        // 5 jobs with a pool of 4: the active indicator averages the first
        // 4, the queued indicator averages all 5 and appears only because
        // the queue is deeper than the pool.
        let source = ScriptedSource::new(vec![0.0, 0.2, 0.4, 0.6, 0.8], 4);
        let channel = Arc::new(RecordingProgressChannel::new());
        let reporter = ProgressReporter::new(source, channel.clone(), fast_config());

        reporter.initiate_reporting();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let live = channel.live();
        assert_eq!(live.len(), 2);

        let active = live.iter().find(|u| u.id.contains("ongoing")).unwrap();
        assert!((active.fraction - 0.3).abs() < 1e-9);
        assert!(active.message.contains("4 ongoing clone jobs"));

        let queued = live.iter().find(|u| u.id.contains("total")).unwrap();
        assert!((queued.fraction - 0.4).abs() < 1e-9);
        assert!(queued.message.contains("Total 5 clone jobs"));

        reporter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_indicator_not_shown_at_or_below_limit() {
        let source = ScriptedSource::new(vec![0.1, 0.9], 4);
        let channel = Arc::new(RecordingProgressChannel::new());
        let reporter = ProgressReporter::new(source, channel.clone(), fast_config());

        reporter.initiate_reporting();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(channel.indicator_ids().len(), 1);
        assert!((channel.live()[0].fraction - 0.5).abs() < 1e-9);

        reporter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_indicator_sticky_once_shown() {
        let source = ScriptedSource::new(vec![0.1, 0.2, 0.3, 0.4, 0.5], 4);
        let channel = Arc::new(RecordingProgressChannel::new());
        let reporter = ProgressReporter::new(source.clone(), channel.clone(), fast_config());

        reporter.initiate_reporting();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(channel.indicator_ids().len(), 2);

        // The queue shrinks below the limit; the second indicator keeps
        // updating rather than disappearing mid-session.
        source.set_ratios(vec![0.7, 0.9]);
        tokio::time::sleep(Duration::from_secs(1)).await;

        let live = channel.live();
        let queued = live.iter().find(|u| u.id.contains("total")).unwrap();
        assert!((queued.fraction - 0.8).abs() < 1e-9);
        assert!(queued.message.contains("Total 2 clone jobs"));

        reporter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampling_failure_freezes_last_value() {
        let source = ScriptedSource::new(vec![0.5], 4);
        let channel = Arc::new(RecordingProgressChannel::new());
        let reporter = ProgressReporter::new(source.clone(), channel.clone(), fast_config());

        reporter.initiate_reporting();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let published = channel.updates().len();
        assert_eq!(published, 1);

        // A cluster-wide outage: every sample fails. The loop survives, the
        // indicator stays, and nothing new is published (no flap to 0%).
        source.set_failing(true);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(reporter.is_active());
        assert_eq!(channel.updates().len(), published);
        assert!(channel.completed().is_empty());

        // Recovery resumes publishing on the same indicator.
        source.set_failing(false);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(channel.updates().len() > published);
        assert_eq!(channel.indicator_ids().len(), 1);

        reporter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_restarts_after_stop() {
        let source = ScriptedSource::new(vec![0.3], 4);
        let channel = Arc::new(RecordingProgressChannel::new());
        let reporter = ProgressReporter::new(source.clone(), channel.clone(), fast_config());

        reporter.initiate_reporting();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        source.set_ratios(vec![]);
        tokio::time::sleep(Duration::from_secs(8)).await;
        assert!(!reporter.is_active());

        // A new campaign starts a fresh session with fresh indicators.
        source.set_ratios(vec![0.1]);
        reporter.initiate_reporting();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(reporter.is_active());
        assert_eq!(source.on_start_calls.load(Ordering::SeqCst), 2);
        assert_eq!(channel.indicator_ids().len(), 2);

        reporter.shutdown().await;
    }
}
