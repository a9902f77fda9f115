//! Progress source for trash purging.
//!
//! Purge has no per-job "total vs. copied" pair: the only durable signal is
//! what remains under the trash roots. A baseline `(entries, files)` is
//! captured when the reporting session starts; each tick's aggregate ratio
//! is the fraction of those baseline files that have since disappeared. One
//! indicator covers the whole batch.
//!
//! Deletions queued after the session started extend the baseline only when
//! the next session begins: a session tracks one campaign of deletions.

use std::sync::Arc;

use async_trait::async_trait;
use grovefs_client::FsClient;
use grovefs_types::Result;
use parking_lot::Mutex;

use crate::config::ConcurrencyLimits;
use crate::layout::{list_volumes, VolumeSpec};
use crate::reporter::{ProgressSource, TickSample};
use crate::trash::{TrashCan, TrashStats};

#[derive(Debug, Clone, Copy)]
struct Baseline {
    subvols: u64,
    files: u64,
}

impl From<TrashStats> for Baseline {
    fn from(stats: TrashStats) -> Self {
        Self {
            subvols: stats.subvols_left,
            files: stats.files_left,
        }
    }
}

/// Counts trash contents cluster-wide and reports batch purge progress.
pub struct PurgeProgressSource {
    fs: Arc<dyn FsClient>,
    spec: VolumeSpec,
    limits: Arc<ConcurrencyLimits>,
    baseline: Mutex<Option<Baseline>>,
}

impl PurgeProgressSource {
    pub fn new(
        fs: Arc<dyn FsClient>,
        spec: VolumeSpec,
        limits: Arc<ConcurrencyLimits>,
    ) -> Self {
        Self {
            fs,
            spec,
            limits,
            baseline: Mutex::new(None),
        }
    }

    /// Sum trash contents across all volumes. Volumes without a trash
    /// directory contribute nothing.
    async fn trash_totals(&self) -> Result<TrashStats> {
        let mut totals = TrashStats::default();

        for volume in list_volumes(self.fs.as_ref(), &self.spec).await? {
            let trash = TrashCan::new(self.fs.clone(), self.spec.trash_path(&volume));
            let stats = trash.stats().await?;
            totals.subvols_left += stats.subvols_left;
            totals.files_left += stats.files_left;
        }

        tracing::debug!(
            subvols = totals.subvols_left,
            files = totals.files_left,
            "Collected trash totals"
        );
        Ok(totals)
    }
}

#[async_trait]
impl ProgressSource for PurgeProgressSource {
    fn op_name(&self) -> &'static str {
        "purge"
    }

    async fn on_start(&self) -> Result<()> {
        let totals = self.trash_totals().await?;
        *self.baseline.lock() = Some(Baseline::from(totals));
        Ok(())
    }

    async fn sample(&self) -> Result<TickSample> {
        let current = self.trash_totals().await?;
        if current.is_empty() {
            return Ok(TickSample {
                ratios: Vec::new(),
                limit: self.limits.max_concurrent_purges(),
            });
        }

        // Self-heal a missing baseline (failed on_start): progress reads as
        // zero until the next session re-baselines.
        let baseline = *self
            .baseline
            .lock()
            .get_or_insert(Baseline::from(current));

        let ratio = if baseline.files == 0 {
            0.0
        } else {
            let done = baseline.files.saturating_sub(current.files_left);
            (done as f64 / baseline.files as f64).clamp(0.0, 1.0)
        };

        Ok(TickSample {
            ratios: vec![ratio],
            limit: self.limits.max_concurrent_purges(),
        })
    }

    fn active_message(&self, _jobs: usize, percent: f64) -> String {
        match *self.baseline.lock() {
            Some(baseline) => format!(
                "Purging {} subvolumes/{} files, average progress = {:.2}%",
                baseline.subvols, baseline.files, percent
            ),
            None => format!("Purging trash, average progress = {:.2}%", percent),
        }
    }

    fn waiting_message(&self) -> String {
        "Trash is empty, waiting briefly for new deletions".to_string()
    }
}
